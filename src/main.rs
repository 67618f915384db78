use crate::options::Args;
use anyhow::{bail, Context};
use clap::Parser;
use std::io::BufRead;
use std::path::{Path, PathBuf};

mod options {
    use std::path::PathBuf;

    #[derive(Debug, clap::Parser)]
    #[clap(name = "mmo", about = "A tool to prepare mail-order fulfillment lists and bill them")]
    pub enum Args {
        /// Turn order feed exports and typed-in orders into deduplicated mailing lists, one per plan year.
        Report {
            /// A RON file with normalization rules and charges, as printed by the `config` subcommand.
            #[clap(long, short = 'c')]
            config: Option<PathBuf>,
            /// The plan year of orders that don't state one. Defaults to the current year.
            #[clap(long, short = 'y')]
            plan_year: Option<i32>,
            /// Write all orders into a single list named after the plan year of the first order.
            #[clap(long)]
            single_year: bool,
            /// A data entry export with a STATUS column, whose CONTACT and LIST rows are added to the orders.
            #[clap(long, short = 'd')]
            data_entry: Option<PathBuf>,
            /// The directory to write all lists into.
            #[clap(long, short = 'o', default_value = ".")]
            out_dir: PathBuf,
            /// CSV exports of the order feed, with the feed's tag names as header.
            orders: Vec<PathBuf>,
        },
        /// Summarize fulfillment jobs and compute the charges of each of their rows.
        Billing {
            /// A RON file with normalization rules and charges, as printed by the `config` subcommand.
            #[clap(long, short = 'c')]
            config: Option<PathBuf>,
            /// The amount of reply envelopes received without order. Asked for interactively if unset.
            #[clap(long, short = 'j')]
            junk_mail: Option<u32>,
            /// The directory to write the summary and billing sheets into.
            #[clap(long, short = 'o', default_value = ".")]
            out_dir: PathBuf,
            /// Job files, or directories to take all files from whose name contains a job label like `W12A`.
            jobs: Vec<PathBuf>,
        },
        /// Print the default configuration to stdout, to be used as a starting point for edits.
        Config,
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let now = time::OffsetDateTime::now_local().unwrap_or_else(|_| time::OffsetDateTime::now_utc());
    let args = options::Args::parse();
    match args {
        Args::Report {
            config,
            plan_year,
            single_year,
            data_entry,
            out_dir,
            orders,
        } => {
            let config = load_config(config)?;
            let normalizer =
                mmo::Normalizer::new(&config.normalization, plan_year.unwrap_or(now.year()));

            let mut feed = Vec::new();
            for (path, read) in orders.iter().zip(into_read(&orders)?) {
                let outcome = mmo::read_raw_orders(read)
                    .with_context(|| format!("Could not read orders from '{}'", path.display()))?;
                if !outcome.malformed_lines.is_empty() {
                    tracing::warn!(
                        path = %path.display(),
                        lines = ?outcome.malformed_lines,
                        "skipped malformed orders"
                    );
                }
                feed.extend(mmo::parse_orders(outcome.records));
            }
            tracing::info!(orders = feed.len(), "parsed order feed");
            if !feed.is_empty() {
                let path = out_dir.join(format!(
                    "MMO_XML_ORDER {}.csv",
                    now.format(time::macros::format_description!("[month]-[day]-[year]"))?
                ));
                mmo::write_orders(&feed, create(&path)?)
                    .with_context(|| format!("Could not write orders to '{}'", path.display()))?;
            }

            if let Some(path) = data_entry {
                let entry = mmo::read_data_entry(open(&path)?).with_context(|| {
                    format!("Could not read data entry from '{}'", path.display())
                })?;
                let sheet = out_dir.join(format!(
                    "MMO CONTACT & DO NOT MAIL {}.csv",
                    now.format(time::macros::format_description!("[month]-[day]-[year]"))?
                ));
                mmo::data_entry::write_contact_sheet(
                    &entry,
                    &now.format(time::macros::format_description!("[month]/[day]/[year]"))?,
                    create(&sheet)?,
                )
                .with_context(|| format!("Could not write contacts to '{}'", sheet.display()))?;
                feed.extend(entry.into_orders());
            }

            let groups = mmo::process(
                feed,
                &normalizer,
                mmo::report::Options {
                    single_year,
                    ..Default::default()
                },
            );
            for group in &groups {
                let path = out_dir.join(group.file_name());
                mmo::write_list(group, create(&path)?)
                    .with_context(|| format!("Could not write list to '{}'", path.display()))?;
            }
        }
        Args::Billing {
            config,
            junk_mail,
            out_dir,
            jobs,
        } => {
            let config = load_config(config)?;
            let files = job_files(jobs)?;
            let run = match files.first() {
                Some(first) => mmo::billing::run_name(&file_name(first)).to_owned(),
                None => bail!("No job files were provided"),
            };
            let jobs = files
                .iter()
                .map(|path| {
                    let name = file_name(path);
                    let label = mmo::billing::job_label(&name).unwrap_or(name.as_str()).to_owned();
                    mmo::read_job(label, open(path)?)
                        .with_context(|| format!("Could not read job from '{}'", path.display()))
                })
                .collect::<anyhow::Result<Vec<_>>>()?;
            let junk_mail = match junk_mail {
                Some(count) => count,
                None => prompt_junk_count()?,
            };

            let report = mmo::calculate(jobs, junk_mail, &config.charges);
            let summary = out_dir.join(format!("{run} EOM summary.csv"));
            mmo::write_summary(&report, create(&summary)?)
                .with_context(|| format!("Could not write summary to '{}'", summary.display()))?;
            let billing = out_dir.join(format!("{run} EOM billing.csv"));
            mmo::write_billing(&report, create(&billing)?)
                .with_context(|| format!("Could not write billing to '{}'", billing.display()))?;
        }
        Args::Config => println!("{}", mmo::Config::default().to_ron()?),
    };
    Ok(())
}

fn load_config(path: Option<PathBuf>) -> anyhow::Result<mmo::Config> {
    Ok(match path {
        Some(path) => mmo::Config::from_path(&path)
            .with_context(|| format!("Could not load configuration from '{}'", path.display()))?,
        None => mmo::Config::default(),
    })
}

/// Expand directories into the job files they contain, sorted by name.
fn job_files(paths: Vec<PathBuf>) -> anyhow::Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut files = std::fs::read_dir(&path)
                .with_context(|| format!("Could not list job directory '{}'", path.display()))?
                .map(|entry| entry.map(|entry| entry.path()))
                .collect::<Result<Vec<_>, _>>()?;
            files.retain(|file| file.is_file() && mmo::billing::job_label(&file_name(file)).is_some());
            files.sort();
            out.extend(files);
        } else {
            out.push(path);
        }
    }
    Ok(out)
}

fn prompt_junk_count() -> anyhow::Result<u32> {
    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        eprint!("Total Junk Mail received: ");
        let line = match lines.next() {
            Some(line) => line?,
            None => bail!("No junk mail count was entered"),
        };
        match mmo::billing::parse_junk_count(&line) {
            Ok(count) => return Ok(count),
            Err(err) => eprintln!("{err}"),
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn open(path: &Path) -> anyhow::Result<std::fs::File> {
    std::fs::File::open(path).with_context(|| format!("Could not open '{}'", path.display()))
}

fn create(path: &Path) -> anyhow::Result<std::io::BufWriter<std::fs::File>> {
    Ok(std::io::BufWriter::new(std::fs::File::create(path).with_context(
        || format!("Could not create '{}'", path.display()),
    )?))
}

fn into_read(file_paths: &[PathBuf]) -> anyhow::Result<impl Iterator<Item = impl std::io::Read>> {
    Ok(file_paths
        .iter()
        .map(|p| {
            std::fs::read(p)
                .with_context(|| format!("Could not read from CSV file at '{}'", p.display()))
        })
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .map(std::io::Cursor::new))
}
