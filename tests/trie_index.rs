//! # Trie Index Tests
//!
//! Labels written by the index builders and read back through
//! `LabelIndex`:
//! 1. Full paths and every suffix truncation find their node
//! 2. Alias rules add county-less, city-less and prefix-trimmed labels
//! 3. Unregistered strings find nothing, including untrimmed variants
//! 4. Note tokens are indexed to the nodes carrying them

use std::path::Path;

use geodict::config::{DATASET_TABLE, NODE_TABLE, NOTE_TRIE_FILE, ROOT_ID};
use geodict::{
    AddressLevel, AddressNode, AliasRule, AliasTable, BuildOptions, DatasetRecord,
    DictionaryBuilder, LabelIndex, PagedTable,
};
use tempfile::tempdir;

const LINES: &str = "\
東京都;1,渋谷区;3,道玄坂;5,一丁目;6,!03,139.6987,35.6575,aza_id:0001001/postcode:1500043
東京都;1,渋谷区;3,道玄坂;5,一丁目;6,2;7,!04,139.6988,35.6576
東京都;1,千代田区;3,霞ケ関;5,一丁目;6,!01,139.7530,35.6750,postcode:1000013
東京都;1,西多摩郡;2,奥多摩町;3,氷川;5,!03,139.0960,35.8050
神奈川県;1,横浜市;3,中区;4,山下町;5,!03,139.6500,35.4430
神奈川県;1,横浜市;3,中区;4,本町;5,一丁目;6,!03,139.6370,35.4500
北海道;1,余市郡;2,余市町;3,大字黒川町;5,!03,140.7700,43.1800,aza_id:0150001
北海道;1,余市郡;2,余市町;3,大字梅ケ丘;5,!03,140.7600,43.1900
";

fn build(dir: &Path, options: BuildOptions) -> Vec<AddressNode> {
    let mut builder = DictionaryBuilder::create(dir, options).unwrap();
    builder.add_region_text("all", "all.txt", LINES).unwrap();
    builder
        .finish(&[
            DatasetRecord::new(1, "位置参照情報", "https://example.org/isj"),
            DatasetRecord::new(3, "電子国土基本図", "https://example.org/gsi"),
        ])
        .unwrap();

    let table: PagedTable<AddressNode> = PagedTable::open(dir, NODE_TABLE, 4).unwrap();
    table.iter().collect::<eyre::Result<_>>().unwrap()
}

fn id_of(nodes: &[AddressNode], path: &[&str]) -> u32 {
    let mut parent = ROOT_ID;
    for name in path {
        parent = nodes
            .iter()
            .find(|n| !n.is_root() && n.parent_id == parent && n.name == *name)
            .unwrap_or_else(|| panic!("{} not found", name))
            .id;
    }
    parent
}

mod label_tests {
    use super::*;

    #[test]
    fn full_path_and_suffixes_are_registered() {
        let dir = tempdir().unwrap();
        let nodes = build(dir.path(), BuildOptions::new().page_size(4));
        let index = LabelIndex::open_address(dir.path()).unwrap();

        let dogenzaka = id_of(&nodes, &["東京都", "渋谷区", "道玄坂"]);
        assert_eq!(index.lookup("東京都渋谷区道玄坂").unwrap(), vec![dogenzaka]);
        assert_eq!(index.lookup("渋谷区道玄坂").unwrap(), vec![dogenzaka]);
        assert_eq!(index.lookup("道玄坂").unwrap(), vec![dogenzaka]);
    }

    #[test]
    fn shared_label_maps_to_every_node() {
        let dir = tempdir().unwrap();
        let nodes = build(dir.path(), BuildOptions::new().page_size(4));
        let index = LabelIndex::open_address(dir.path()).unwrap();

        let expected: Vec<u32> = nodes
            .iter()
            .filter(|n| n.name_index == "一丁目")
            .map(|n| n.id)
            .collect();
        assert_eq!(expected.len(), 3);
        assert_eq!(index.lookup("一丁目").unwrap(), expected);
    }

    #[test]
    fn nodes_below_cutoff_get_no_labels() {
        let dir = tempdir().unwrap();
        build(dir.path(), BuildOptions::new());
        let index = LabelIndex::open_address(dir.path()).unwrap();
        assert!(index.lookup("道玄坂一丁目2").unwrap().is_empty());

        let dir = tempdir().unwrap();
        build(dir.path(), BuildOptions::new().trie_cutoff(AddressLevel::OAZA));
        let index = LabelIndex::open_address(dir.path()).unwrap();
        assert!(index.lookup("一丁目").unwrap().is_empty());
        assert!(!index.lookup("道玄坂").unwrap().is_empty());
    }

    #[test]
    fn spelling_variant_of_own_name() {
        let dir = tempdir().unwrap();
        let nodes = build(dir.path(), BuildOptions::new());
        let index = LabelIndex::open_address(dir.path()).unwrap();

        let kasumigaseki = id_of(&nodes, &["東京都", "千代田区", "霞ケ関"]);
        assert_eq!(index.lookup("東京都千代田区霞ガ関").unwrap(), vec![kasumigaseki]);
        assert_eq!(index.lookup("霞ガ関").unwrap(), vec![kasumigaseki]);
    }

    #[test]
    fn prefixes_of_free_text() {
        let dir = tempdir().unwrap();
        build(dir.path(), BuildOptions::new());
        let index = LabelIndex::open_address(dir.path()).unwrap();

        let found: Vec<String> = index
            .prefixes("東京都渋谷区道玄坂一丁目3番")
            .unwrap()
            .into_iter()
            .map(|(label, _)| label)
            .collect();
        assert_eq!(
            found,
            vec![
                "東京都",
                "東京都渋谷区",
                "東京都渋谷区道玄坂",
                "東京都渋谷区道玄坂一丁目",
            ]
        );
    }
}

mod alias_tests {
    use super::*;

    #[test]
    fn county_can_be_omitted() {
        let dir = tempdir().unwrap();
        let nodes = build(dir.path(), BuildOptions::new());
        let index = LabelIndex::open_address(dir.path()).unwrap();

        let hikawa = id_of(&nodes, &["東京都", "西多摩郡", "奥多摩町", "氷川"]);
        assert_eq!(index.lookup("東京都西多摩郡奥多摩町氷川").unwrap(), vec![hikawa]);
        assert_eq!(index.lookup("東京都奥多摩町氷川").unwrap(), vec![hikawa]);
    }

    #[test]
    fn county_is_not_registered_under_its_prefecture() {
        let dir = tempdir().unwrap();
        let nodes = build(dir.path(), BuildOptions::new());
        let index = LabelIndex::open_address(dir.path()).unwrap();

        let tokyo = id_of(&nodes, &["東京都"]);
        let nishitama = id_of(&nodes, &["東京都", "西多摩郡"]);
        let hokkaido = id_of(&nodes, &["北海道"]);

        assert_eq!(index.lookup("東京都").unwrap(), vec![tokyo]);
        assert_eq!(index.lookup("北海道").unwrap(), vec![hokkaido]);
        assert_eq!(index.lookup("東京都西多摩郡").unwrap(), vec![nishitama]);
        assert_eq!(index.lookup("西多摩郡").unwrap(), vec![nishitama]);
    }

    #[test]
    fn designated_city_ward_without_city() {
        let dir = tempdir().unwrap();
        let nodes = build(dir.path(), BuildOptions::new());
        let index = LabelIndex::open_address(dir.path()).unwrap();

        let yamashita = id_of(&nodes, &["神奈川県", "横浜市", "中区", "山下町"]);
        assert_eq!(index.lookup("神奈川県中区山下町").unwrap(), vec![yamashita]);
        assert_eq!(index.lookup("中区山下町").unwrap(), vec![yamashita]);
        assert_eq!(index.lookup("横浜市中区山下町").unwrap(), vec![yamashita]);
    }

    #[test]
    fn honorific_prefix_is_trimmed_only_where_present() {
        let dir = tempdir().unwrap();
        let nodes = build(dir.path(), BuildOptions::new());
        let index = LabelIndex::open_address(dir.path()).unwrap();

        let kurokawa = id_of(&nodes, &["北海道", "余市郡", "余市町", "大字黒川町"]);
        assert_eq!(
            index.lookup("北海道余市郡余市町大字黒川町").unwrap(),
            vec![kurokawa]
        );
        assert_eq!(index.lookup("余市町黒川町").unwrap(), vec![kurokawa]);
        assert_eq!(index.lookup("黒川町").unwrap(), vec![kurokawa]);

        assert!(index.lookup("字黒川町").unwrap().is_empty());
        assert!(index.lookup("余市町字黒川町").unwrap().is_empty());
        assert!(index.lookup("大字").unwrap().is_empty());
    }

    #[test]
    fn trimmed_name_gets_spelling_variants() {
        let dir = tempdir().unwrap();
        let nodes = build(dir.path(), BuildOptions::new());
        let index = LabelIndex::open_address(dir.path()).unwrap();

        let umegaoka = id_of(&nodes, &["北海道", "余市郡", "余市町", "大字梅ケ丘"]);
        for label in ["梅ケ丘", "梅ガ丘", "余市町梅ガ丘", "北海道余市町梅ガ丘", "大字梅ガ丘"] {
            assert_eq!(index.lookup(label).unwrap(), vec![umegaoka], "{}", label);
        }
    }

    #[test]
    fn unregistered_strings_find_nothing() {
        let dir = tempdir().unwrap();
        build(dir.path(), BuildOptions::new());
        let index = LabelIndex::open_address(dir.path()).unwrap();

        for text in ["渋谷", "東京都渋谷区宇田川町", "道玄坂東京都", ""] {
            assert!(index.lookup(text).unwrap().is_empty(), "{:?}", text);
        }
    }

    #[test]
    fn custom_substitution() {
        let dir = tempdir().unwrap();
        let aliases = AliasTable::standard().with_rule(AliasRule::Substitute {
            level: AddressLevel::CITY,
            name: "横浜市".to_string(),
            alternative: "横濱市".to_string(),
        });
        let nodes = build(dir.path(), BuildOptions::new().aliases(aliases));
        let index = LabelIndex::open_address(dir.path()).unwrap();

        let yamashita = id_of(&nodes, &["神奈川県", "横浜市", "中区", "山下町"]);
        assert_eq!(index.lookup("神奈川県横濱市中区山下町").unwrap(), vec![yamashita]);

        let dir = tempdir().unwrap();
        build(dir.path(), BuildOptions::new());
        let index = LabelIndex::open_address(dir.path()).unwrap();
        assert!(index.lookup("神奈川県横濱市中区山下町").unwrap().is_empty());
    }
}

mod note_tests {
    use super::*;

    #[test]
    fn note_tokens_find_their_nodes() {
        let dir = tempdir().unwrap();
        let nodes = build(dir.path(), BuildOptions::new().page_size(2));
        let notes = LabelIndex::open_notes(dir.path()).unwrap();

        let chome = id_of(&nodes, &["東京都", "渋谷区", "道玄坂", "一丁目"]);
        let kasumigaseki = id_of(&nodes, &["東京都", "千代田区", "霞ケ関", "一丁目"]);

        assert_eq!(notes.len(), 4);
        assert_eq!(notes.lookup("aza_id:0001001").unwrap(), vec![chome]);
        assert_eq!(notes.lookup("postcode:1500043").unwrap(), vec![chome]);
        assert_eq!(notes.lookup("postcode:1000013").unwrap(), vec![kasumigaseki]);
        assert!(notes.lookup("postcode:9999999").unwrap().is_empty());
    }

    #[test]
    fn note_index_can_be_disabled() {
        let dir = tempdir().unwrap();
        build(dir.path(), BuildOptions::new().index_notes(false));

        assert!(!dir.path().join(NOTE_TRIE_FILE).exists());
        assert!(LabelIndex::open_notes(dir.path()).is_err());
    }
}

mod dataset_tests {
    use super::*;

    #[test]
    fn datasets_are_written_in_order() {
        let dir = tempdir().unwrap();
        build(dir.path(), BuildOptions::new());

        let table: PagedTable<DatasetRecord> =
            PagedTable::open(dir.path(), DATASET_TABLE, 1).unwrap();
        let ids: Vec<u32> = table.iter().map(|r| r.unwrap().id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(table.get_record(1).unwrap().title, "電子国土基本図");
    }
}
