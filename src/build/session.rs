//! # Dictionary Builder
//!
//! `DictionaryBuilder` owns all state of one build: the output directory,
//! the options, the standardizer and the tree under construction. Nothing is
//! shared between builders, so independent builds can run side by side in
//! one process.
//!
//! ## Build Flow
//!
//! ```text
//! create(dir, options)
//!   └─ for each region (typically a prefecture):
//!        add_text_dir_region / add_region_files / add_region_text
//!          SortMergeStager -> sorted spill file -> TreeBuilder -> close_region
//! finish(datasets)
//!   ├─ TreeBuilder::finish          address_node sealed, fix-ups resolved
//!   ├─ dataset table                provenance records
//!   ├─ TrieIndexBuilder             address.trie + trie_node
//!   └─ note index (optional)        note.trie + note_node
//! ```
//!
//! ## Configuration Options
//!
//! | Option         | Default                 | Description                          |
//! |----------------|-------------------------|--------------------------------------|
//! | page_size      | 500,000                 | Records per page file                |
//! | cache_capacity | 10                      | Page mappings kept open per table    |
//! | trie_cutoff    | `AddressLevel::AZA`     | Finest level that receives labels    |
//! | aliases        | `AliasTable::standard()`| Alternative path rules               |
//! | index_notes    | true                    | Build the note token index           |
//!
//! ## Failure Policy
//!
//! Any hard error aborts the build and is returned to the caller with the
//! offending file and line where one exists. Regions already written stay on
//! disk; recovery is rebuilding into a fresh directory.
//!
//! A malformed line is caught while staging, before the tree is touched, and
//! leaves the builder usable. Once a region fails after its lines started
//! reaching the tree, the builder is poisoned: every later `add_*` and
//! `finish` call fails instead of sealing a half-open ancestor chain.
//!
//! ## Usage
//!
//! ```ignore
//! let mut builder = DictionaryBuilder::create("./dict", BuildOptions::new())?;
//! builder.add_text_dir_region("./text", "13")?;
//! builder.add_text_dir_region("./text", "14")?;
//! let summary = builder.finish(&[DatasetRecord::new(1, "市区町村", "https://...")])?;
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use eyre::{bail, Result, WrapErr};
use tracing::{info, warn};

use super::stager::SortMergeStager;
use super::tree::TreeBuilder;
use crate::address::{AddressLevel, NfkcStandardizer, Standardizer};
use crate::config::{DATASET_TABLE, NODE_TABLE, PAGE_CACHE_CAPACITY, PAGE_SIZE};
use crate::index::{build_note_index, AliasTable, TrieIndexBuilder};
use crate::records::DatasetRecord;
use crate::storage::{PagedTable, TableOptions};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    page_size: usize,
    cache_capacity: usize,
    trie_cutoff: AddressLevel,
    aliases: AliasTable,
    index_notes: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl BuildOptions {
    pub fn new() -> Self {
        Self {
            page_size: PAGE_SIZE,
            cache_capacity: PAGE_CACHE_CAPACITY,
            trie_cutoff: AddressLevel::AZA,
            aliases: AliasTable::standard(),
            index_notes: true,
        }
    }

    /// Sets the number of records per page file for every table.
    pub fn page_size(mut self, records: usize) -> Self {
        self.page_size = records;
        self
    }

    /// Sets how many page files each table keeps mapped.
    pub fn cache_capacity(mut self, pages: usize) -> Self {
        self.cache_capacity = pages;
        self
    }

    /// Nodes finer than `level` get no trie labels.
    pub fn trie_cutoff(mut self, level: AddressLevel) -> Self {
        self.trie_cutoff = level;
        self
    }

    pub fn aliases(mut self, aliases: AliasTable) -> Self {
        self.aliases = aliases;
        self
    }

    pub fn index_notes(mut self, enabled: bool) -> Self {
        self.index_notes = enabled;
        self
    }

    pub fn table_options(&self) -> TableOptions {
        TableOptions::default()
            .page_size(self.page_size)
            .cache_capacity(self.cache_capacity)
    }
}

/// Counters for one region.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegionSummary {
    pub region: String,
    pub sources: usize,
    pub lines: u64,
    pub duplicates: u64,
    pub nodes: u64,
}

/// Counters for a finished build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildSummary {
    pub regions: usize,
    pub lines: u64,
    pub duplicates: u64,
    pub nodes: u64,
    pub fixups: u64,
    pub labels: u64,
    pub note_tokens: u64,
    pub datasets: usize,
}

pub struct DictionaryBuilder {
    dir: PathBuf,
    options: BuildOptions,
    standardizer: Box<dyn Standardizer>,
    tree: TreeBuilder,
    regions: usize,
    poisoned: Option<String>,
}

impl DictionaryBuilder {
    /// Starts a build in `dir` with the default standardizer. An existing
    /// node table in `dir` is replaced.
    pub fn create<P: AsRef<Path>>(dir: P, options: BuildOptions) -> Result<Self> {
        Self::with_standardizer(dir, options, NfkcStandardizer)
    }

    pub fn with_standardizer<P, S>(dir: P, options: BuildOptions, standardizer: S) -> Result<Self>
    where
        P: AsRef<Path>,
        S: Standardizer + 'static,
    {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).wrap_err_with(|| {
            format!("failed to create dictionary directory '{}'", dir.display())
        })?;

        let nodes = PagedTable::create(&dir, NODE_TABLE, options.table_options())?;
        let tree = TreeBuilder::new(nodes)?;

        info!(dir = %dir.display(), page_size = options.page_size, "started dictionary build");

        Ok(Self {
            dir,
            options,
            standardizer: Box::new(standardizer),
            tree,
            regions: 0,
            poisoned: None,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    /// Adds one region given as in-memory text.
    pub fn add_region_text(
        &mut self,
        region: &str,
        origin: &str,
        text: &str,
    ) -> Result<RegionSummary> {
        self.check_usable()?;
        let mut stager = SortMergeStager::new(self.standardizer.as_ref());
        stager.add_text(origin, text)?;
        let built = Self::build_region(&mut self.tree, &mut self.regions, region, 1, stager);
        self.poison_on_error(region, built)
    }

    /// Adds one region made of the given files, read in the given order.
    pub fn add_region_files<P: AsRef<Path>>(
        &mut self,
        region: &str,
        files: &[P],
    ) -> Result<RegionSummary> {
        self.check_usable()?;
        let mut stager = SortMergeStager::new(self.standardizer.as_ref());
        for file in files {
            stager.add_file(file)?;
        }
        let sources = files.len();
        let built = Self::build_region(&mut self.tree, &mut self.regions, region, sources, stager);
        self.poison_on_error(region, built)
    }

    /// Adds every `{code}_*.txt` file of `text_dir`, in file-name order, as
    /// region `code`.
    pub fn add_text_dir_region<P: AsRef<Path>>(
        &mut self,
        text_dir: P,
        code: &str,
    ) -> Result<RegionSummary> {
        self.check_usable()?;
        let text_dir = text_dir.as_ref();
        let files = region_files(text_dir, code)?;

        if files.is_empty() {
            warn!(dir = %text_dir.display(), region = code, "no source files for region");
            return Ok(RegionSummary {
                region: code.to_string(),
                ..RegionSummary::default()
            });
        }

        self.add_region_files(code, &files)
    }

    fn check_usable(&self) -> Result<()> {
        if let Some(region) = &self.poisoned {
            bail!(
                "dictionary build in '{}' was aborted by region '{}'",
                self.dir.display(),
                region
            );
        }
        Ok(())
    }

    fn poison_on_error(
        &mut self,
        region: &str,
        built: Result<RegionSummary>,
    ) -> Result<RegionSummary> {
        if built.is_err() {
            self.poisoned = Some(region.to_string());
        }
        built
    }

    fn build_region(
        tree: &mut TreeBuilder,
        regions: &mut usize,
        region: &str,
        sources: usize,
        stager: SortMergeStager<'_>,
    ) -> Result<RegionSummary> {
        let before = tree.stats();
        let nodes_before = tree.node_count();

        for entry in stager.sort()? {
            let entry = entry?;
            tree.add_line(&entry.segments, &entry.line)
                .wrap_err_with(|| format!("failed to build region '{}'", region))?;
        }
        tree.close_region()
            .wrap_err_with(|| format!("failed to close region '{}'", region))?;
        *regions += 1;

        let after = tree.stats();
        let summary = RegionSummary {
            region: region.to_string(),
            sources,
            lines: after.lines - before.lines,
            duplicates: after.duplicates - before.duplicates,
            nodes: tree.node_count() - nodes_before,
        };

        info!(
            region,
            sources,
            lines = summary.lines,
            duplicates = summary.duplicates,
            nodes = summary.nodes,
            "region built"
        );
        Ok(summary)
    }

    /// Seals the node table and writes the dataset table and the indexes.
    pub fn finish(self, datasets: &[DatasetRecord]) -> Result<BuildSummary> {
        self.check_usable()?;
        let Self {
            dir,
            options,
            standardizer,
            tree,
            regions,
            poisoned: _,
        } = self;
        let table_options = options.table_options();

        let (nodes, stats) = tree.finish()?;
        info!(nodes = stats.nodes, duplicates = stats.duplicates, "address tree written");

        let mut dataset_table: PagedTable<DatasetRecord> =
            PagedTable::create(&dir, DATASET_TABLE, table_options)?;
        dataset_table.append_records(datasets)?;

        let labels =
            TrieIndexBuilder::new(standardizer.as_ref(), &options.aliases, options.trie_cutoff)
                .build(&nodes, &dir, table_options)
                .wrap_err("failed to build address trie index")?;

        let note_tokens = if options.index_notes {
            build_note_index(&nodes, &dir, table_options).wrap_err("failed to build note index")?
        } else {
            0
        };

        let summary = BuildSummary {
            regions,
            lines: stats.lines,
            duplicates: stats.duplicates,
            nodes: stats.nodes,
            fixups: stats.fixups,
            labels,
            note_tokens,
            datasets: datasets.len(),
        };
        info!(?summary, "dictionary build finished");
        Ok(summary)
    }
}

/// `{code}_*.txt` files of `text_dir`, sorted by file name.
fn region_files(text_dir: &Path, code: &str) -> Result<Vec<PathBuf>> {
    let prefix = format!("{}_", code);
    let entries = fs::read_dir(text_dir)
        .wrap_err_with(|| format!("failed to list '{}'", text_dir.display()))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.wrap_err_with(|| format!("failed to list '{}'", text_dir.display()))?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if name.starts_with(&prefix) && name.ends_with(".txt") && entry.path().is_file() {
            files.push(entry.path());
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}
