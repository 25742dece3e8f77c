use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use dtg_directory::catalog::LevelCode;
use dtg_directory::{ContentLoader, ContentSource, filter, level};
use serde_json::json;

#[derive(Parser, Debug)]
#[command(name = "dtg-directory", about = "Explore the DTG curated-links catalog", version)]
pub struct Cli {
    /// Emit JSON instead of human-readable tables.
    #[arg(long, global = true)]
    json: bool,

    /// Region whose override document should be applied.
    #[arg(long, global = true, default_value = "global")]
    region: String,

    /// Read content documents from a directory instead of the built-in catalog.
    #[arg(long, global = true, value_name = "DIR", conflicts_with = "content_url")]
    content_dir: Option<PathBuf>,

    /// Fetch content documents from an HTTP base URL.
    #[arg(long, global = true, value_name = "URL")]
    content_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Operations on the resolved catalog.
    #[command(subcommand)]
    Catalog(CatalogCommand),
    /// Map a hostname to its education level.
    Detect {
        /// Hostname whose first label selects the level.
        hostname: String,
    },
    /// Run the HTTP front end.
    #[cfg(feature = "web")]
    Serve {
        /// Address to bind.
        #[arg(long, default_value = "127.0.0.1:8080")]
        addr: std::net::SocketAddr,
        /// Page chrome: tailwind or bootstrap.
        #[arg(long, default_value_t = dtg_directory::web::WebTheme::default())]
        theme: dtg_directory::web::WebTheme,
        /// External base URL advertised by the server.
        #[arg(long, default_value = "http://127.0.0.1:8080")]
        base_url: String,
    },
}

#[derive(Subcommand, Debug)]
enum CatalogCommand {
    /// List the three education levels.
    Levels,
    /// List a level's subjects in declared order.
    Subjects {
        /// Level code (k, p, or h).
        #[arg(long)]
        level: LevelCode,
    },
    /// List the links for one subject, optionally filtered.
    Links {
        /// Level code (k, p, or h).
        #[arg(long)]
        level: LevelCode,
        /// Subject name, case-sensitive (e.g. Science).
        #[arg(long)]
        subject: String,
        /// Case-insensitive filter over title, description, and URL.
        #[arg(long)]
        query: Option<String>,
    },
}

impl Cli {
    fn content_source(&self) -> ContentSource {
        if let Some(dir) = &self.content_dir {
            ContentSource::Dir(dir.clone())
        } else if let Some(base_url) = &self.content_url {
            ContentSource::Http {
                base_url: base_url.clone(),
            }
        } else {
            ContentSource::BuiltIn
        }
    }
}

pub async fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    match &cli.command {
        Command::Catalog(command) => {
            let loader = ContentLoader::new(cli.content_source());
            let catalog = loader.load(&cli.region).await;
            match command {
                CatalogCommand::Levels => handle_levels(&catalog, cli.json),
                CatalogCommand::Subjects { level } => handle_subjects(&catalog, *level, cli.json),
                CatalogCommand::Links {
                    level,
                    subject,
                    query,
                } => handle_links(&catalog, *level, subject, query.as_deref(), cli.json),
            }
        }
        Command::Detect { hostname } => handle_detect(hostname, cli.json),
        #[cfg(feature = "web")]
        Command::Serve {
            addr,
            theme,
            base_url,
        } => {
            init_tracing();
            let config = dtg_directory::web::WebConfig {
                addr: *addr,
                theme: *theme,
                base_url: base_url.clone(),
                source: cli.content_source(),
            };
            dtg_directory::web::serve(config).await?;
            Ok(())
        }
    }
}

#[cfg(feature = "web")]
fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .init();
}

fn handle_levels(
    catalog: &dtg_directory::Catalog,
    as_json: bool,
) -> Result<(), Box<dyn Error>> {
    let rows: Vec<(LevelCode, &str, usize)> = catalog
        .levels()
        .iter()
        .map(|(code, level)| (*code, level.label.as_str(), level.subjects.len()))
        .collect();

    if as_json {
        let payload: Vec<_> = rows
            .iter()
            .map(|(code, label, subjects)| {
                json!({ "code": code, "label": label, "subjects": subjects })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        println!("{:<6}  {:<14}  {}", "CODE", "LABEL", "SUBJECTS");
        println!("{:-<6}  {:-<14}  {:-<8}", "", "", "");
        for (code, label, subjects) in rows {
            println!("{:<6}  {:<14}  {}", code.as_str(), label, subjects);
        }
    }
    Ok(())
}

fn handle_subjects(
    catalog: &dtg_directory::Catalog,
    level: LevelCode,
    as_json: bool,
) -> Result<(), Box<dyn Error>> {
    let level_catalog = catalog.level(level);

    if as_json {
        let payload = json!({
            "level": level,
            "label": level_catalog.label,
            "subjects": level_catalog.subjects.iter().map(|(subject, links)| {
                json!({ "subject": subject, "links": links.len() })
            }).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        println!("Subjects for {}:", level_catalog.label);
        let width = level_catalog
            .subjects
            .keys()
            .map(String::len)
            .max()
            .unwrap_or(7)
            .max("SUBJECT".len());
        println!("{:<width$}  {}", "SUBJECT", "LINKS", width = width);
        println!("{:-<width$}  {:-<5}", "", "", width = width);
        for (subject, links) in &level_catalog.subjects {
            println!("{:<width$}  {}", subject, links.len(), width = width);
        }
    }
    Ok(())
}

fn handle_links(
    catalog: &dtg_directory::Catalog,
    level: LevelCode,
    subject: &str,
    query: Option<&str>,
    as_json: bool,
) -> Result<(), Box<dyn Error>> {
    let query = query.unwrap_or_default();
    let items = filter::visible_items(catalog, level, subject, query);

    if as_json {
        let payload = json!({
            "level": level,
            "subject": subject,
            "query": query,
            "count": items.len(),
            "results": items.iter().map(|item| {
                json!({
                    "key": item.key(),
                    "title": item.title,
                    "url": item.url,
                    "description": item.description,
                    "image": item.image,
                })
            }).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    if items.is_empty() {
        if query.is_empty() {
            println!("No links for {subject:?} at level {level}.");
        } else {
            println!("No links for {subject:?} at level {level} matched {query:?}.");
        }
        return Ok(());
    }
    println!("{} ({} links):", subject, items.len());
    for item in items {
        println!("- {}: {}", item.title, item.description);
        println!("  {}", item.url);
    }
    Ok(())
}

fn handle_detect(hostname: &str, as_json: bool) -> Result<(), Box<dyn Error>> {
    let code = level::detect(hostname);
    if as_json {
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({ "hostname": hostname, "level": code }))?
        );
    } else {
        println!("{}", code.as_str());
    }
    Ok(())
}
