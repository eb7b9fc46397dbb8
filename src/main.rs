use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use clap;
use structopt::StructOpt;

use mediachapters::info::chapter_info;
use mediachapters::{chapfile, MediaChapter};

#[derive(StructOpt, Debug)]
#[structopt(setting = clap::AppSettings::VersionlessSubcommands)]
pub struct MainOpts {
    #[structopt(long)]
    /// Log options (like RUST_LOG; trace, debug, info etc)
    pub log: Option<String>,
    #[structopt(subcommand)]
    pub cmd: Command,
}

#[derive(StructOpt, Debug)]
#[structopt(rename_all = "kebab-case")]
pub enum Command {
    #[structopt(display_order = 1)]
    /// List the chapters of a media file or chapter file.
    List(ListOpts),

    #[structopt(display_order = 2)]
    /// Write the chapters of a media file to a .chap file.
    Export(ExportOpts),

    #[structopt(display_order = 3)]
    /// Find the media file that belongs to a .chap file.
    BaseMedia(BaseMediaOpts),

    #[structopt(display_order = 4)]
    /// Find the .chap file that belongs to a media file.
    Find(FindOpts),
}

#[derive(StructOpt, Debug)]
pub struct ListOpts {
    #[structopt(short, long)]
    /// Output in JSON
    pub json: bool,

    #[structopt(short, long, default_value = "0")]
    /// Select the title language (0 is the first).
    pub language: usize,

    #[structopt(parse(from_os_str))]
    /// Input filename.
    pub input: PathBuf,
}

#[derive(StructOpt, Debug)]
pub struct ExportOpts {
    #[structopt(short, long, default_value = "0")]
    /// Select the title language (0 is the first).
    pub language: usize,

    #[structopt(parse(from_os_str))]
    /// Input filename.
    pub input:  PathBuf,
    #[structopt(parse(from_os_str))]
    /// Output filename (the extension is changed to .chap).
    pub output: PathBuf,
}

#[derive(StructOpt, Debug)]
pub struct BaseMediaOpts {
    #[structopt(parse(from_os_str))]
    /// Chapter filename.
    pub chapfile: PathBuf,
}

#[derive(StructOpt, Debug)]
pub struct FindOpts {
    #[structopt(parse(from_os_str))]
    /// Media filename.
    pub media: PathBuf,
}

fn main() -> Result<()> {
    let opts = MainOpts::from_args();

    let mut builder = env_logger::Builder::new();
    if let Some(ref log_opts) = opts.log {
        builder.parse_filters(log_opts);
    } else if let Ok(ref log_opts) = std::env::var("RUST_LOG") {
        builder.parse_filters(log_opts);
    } else {
        builder.parse_filters("info");
    }
    builder.init();

    match opts.cmd {
        Command::List(opts) => return list(opts),
        Command::Export(opts) => return export(opts),
        Command::BaseMedia(opts) => return base_media(opts),
        Command::Find(opts) => return find(opts),
    }
}

// A .chap file is read as text, anything else as a media file.
fn read_any(path: &Path) -> Result<Vec<MediaChapter>> {
    let is_chapfile = path
        .extension()
        .map(|e| e.eq_ignore_ascii_case(chapfile::CHAPTER_FILE_EXTENSION))
        .unwrap_or(false);
    let chapters = if is_chapfile {
        chapfile::read_chapter_file(path)?
    } else {
        mediachapters::read_chapters(path)?
    };
    Ok(chapters)
}

fn list(opts: ListOpts) -> Result<()> {
    let chapters = read_any(&opts.input)?;
    let info = chapter_info(&chapters, opts.language);
    if opts.json {
        let json = serde_json::to_string_pretty(&info)?;
        println!("{}", json);
    } else {
        for c in &info {
            println!("{}", c);
        }
    }
    Ok(())
}

fn export(opts: ExportOpts) -> Result<()> {
    let chapters = mediachapters::read_chapters(&opts.input)?;
    let path = chapfile::write_chapter_file(&opts.output, &chapters, opts.language)?;
    log::info!("wrote {} chapters to {}", chapters.len(), path.display());
    Ok(())
}

fn base_media(opts: BaseMediaOpts) -> Result<()> {
    match chapfile::find_base_media_file(&opts.chapfile) {
        Some(path) => println!("{}", path.display()),
        None => return Err(anyhow!("{}: no base media file found", opts.chapfile.display())),
    }
    Ok(())
}

fn find(opts: FindOpts) -> Result<()> {
    match chapfile::find_chapter_file(&opts.media) {
        Some(path) => println!("{}", path.display()),
        None => return Err(anyhow!("{}: no chapter file found", opts.media.display())),
    }
    Ok(())
}
