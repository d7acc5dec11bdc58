//! five38 catalog commands
//!
//! Listing projects, listing a project's data sources, flattening the whole
//! tree, and describing a single entry.

use anyhow::{Context, Result};
use clap::Subcommand;
use std::path::Path;
use std::sync::Arc;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

use five38_core::{
    walk, Catalog, Entry, HttpTransport, RepositoryConfig, RootCatalog, Transport,
    DEFAULT_WALK_DEPTH,
};

#[derive(Subcommand, Debug)]
pub enum CatalogCommand {
    /// List projects, optionally filtered by a name substring
    Projects {
        /// Substring the project name must contain (case-sensitive)
        query: Option<String>,

        /// Output results as JSON
        #[clap(long)]
        json: bool,
    },

    /// List the data sources of one project
    Sources {
        /// Project name (directory name or its underscore form)
        project: String,

        /// Output results as JSON
        #[clap(long)]
        json: bool,
    },

    /// Flatten the catalog into dotted entry names
    Walk {
        /// Only include projects whose name contains this substring
        #[clap(long)]
        query: Option<String>,

        /// Number of levels to expand
        #[clap(long, default_value_t = DEFAULT_WALK_DEPTH)]
        depth: usize,

        /// Output results as JSON
        #[clap(long)]
        json: bool,
    },

    /// Describe one entry by its dotted name (e.g. college_majors.all_ages)
    Show {
        /// Dotted entry name as printed by `walk`
        name: String,

        /// Only search projects whose name contains this substring
        #[clap(long)]
        query: Option<String>,
    },

    /// Print the effective configuration
    Config,
}

impl CatalogCommand {
    pub fn execute(self, config_path: Option<&Path>) -> Result<()> {
        let config = load_config(config_path)?;

        match self {
            CatalogCommand::Projects { query, json } => execute_projects(config, query, json),
            CatalogCommand::Sources { project, json } => execute_sources(config, &project, json),
            CatalogCommand::Walk { query, depth, json } => {
                execute_walk(config, query, depth, json)
            }
            CatalogCommand::Show { name, query } => execute_show(config, &name, query),
            CatalogCommand::Config => {
                print!("{}", serde_yaml_ng::to_string(&config)?);
                Ok(())
            }
        }
    }
}

fn load_config(config_path: Option<&Path>) -> Result<RepositoryConfig> {
    match config_path {
        Some(path) => RepositoryConfig::load_from_path(path),
        None => RepositoryConfig::load(),
    }
}

fn open_root(config: RepositoryConfig, query: Option<String>) -> Result<RootCatalog> {
    let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(&config)?);
    tracing::debug!(
        "Opening catalog for {} via {} transport",
        config.repository,
        transport.name()
    );
    Ok(RootCatalog::new(Arc::new(config), transport, query))
}

/// Table row for project listings
#[derive(Tabled)]
struct ProjectRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "URL")]
    url: String,
}

fn execute_projects(
    config: RepositoryConfig,
    query: Option<String>,
    json_output: bool,
) -> Result<()> {
    let mut root = open_root(config, query)?;
    let projects = root.projects().context("Failed to load projects")?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(projects)?);
        return Ok(());
    }

    if projects.is_empty() {
        println!("No projects found.");
        return Ok(());
    }

    println!("Found {} project(s):\n", projects.len());

    let rows: Vec<ProjectRow> = projects
        .iter()
        .map(|project| ProjectRow {
            name: project.name.clone(),
            title: truncate(project.title(), 50),
            url: project.url.clone(),
        })
        .collect();

    println!("{}", render(&rows));
    Ok(())
}

/// Table row for data source listings
#[derive(Tabled)]
struct SourceRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Path")]
    path: String,
    #[tabled(rename = "URL")]
    url: String,
}

fn execute_sources(config: RepositoryConfig, project: &str, json_output: bool) -> Result<()> {
    let mut root = open_root(config, None)?;
    let mut catalog = root
        .project(project)
        .with_context(|| format!("Project '{project}' not found"))?;

    let sources: Vec<_> = catalog
        .entries()
        .context("Failed to load data sources")?
        .values()
        .filter_map(Entry::as_source)
        .cloned()
        .collect();

    if json_output {
        println!("{}", serde_json::to_string_pretty(&sources)?);
        return Ok(());
    }

    if sources.is_empty() {
        println!("Project '{project}' has no CSV files.");
        return Ok(());
    }

    let rows: Vec<SourceRow> = sources
        .iter()
        .map(|source| SourceRow {
            name: source.name.clone(),
            path: source.path.clone(),
            url: source.urlpath().unwrap_or_default().to_string(),
        })
        .collect();

    println!("{}", render(&rows));

    for collision in catalog.collisions()? {
        println!(
            "warning: '{}' hides '{}' (both named {})",
            collision.kept, collision.dropped, collision.name
        );
    }

    Ok(())
}

/// Table row for walk output
#[derive(Tabled)]
struct WalkRow {
    #[tabled(rename = "Entry")]
    name: String,
    #[tabled(rename = "Kind")]
    kind: &'static str,
}

fn execute_walk(
    config: RepositoryConfig,
    query: Option<String>,
    depth: usize,
    json_output: bool,
) -> Result<()> {
    let mut root = open_root(config, query)?;
    let flat = walk(&mut root, depth).context("Failed to load catalog")?;

    if json_output {
        let described: serde_json::Map<String, serde_json::Value> = flat
            .iter()
            .map(|(name, entry)| (name.clone(), entry.describe()))
            .collect();
        println!("{}", serde_json::to_string_pretty(&described)?);
        return Ok(());
    }

    let rows: Vec<WalkRow> = flat
        .iter()
        .map(|(name, entry)| WalkRow {
            name: name.clone(),
            kind: entry.kind(),
        })
        .collect();

    println!("{}", render(&rows));
    Ok(())
}

fn execute_show(config: RepositoryConfig, name: &str, query: Option<String>) -> Result<()> {
    let depth = name.split('.').count().max(1);
    let mut root = open_root(config, query)?;
    let flat = walk(&mut root, depth).context("Failed to load catalog")?;

    let entry = flat
        .get(name)
        .with_context(|| format!("No entry named '{name}'"))?;

    println!("{}", serde_json::to_string_pretty(&entry.describe())?);
    Ok(())
}

fn render<T: Tabled>(rows: &[T]) -> String {
    Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()))
        .to_string()
}

/// Cut `text` to at most `max` characters, marking the cut with "..."
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }

    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}
