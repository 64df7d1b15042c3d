use calib_library::{Options, organize};
use clap::Parser;

#[derive(Parser)]
#[command(author, version, about = "Copy and organize master calibration frames into a library", long_about = None)]
struct Args {
    /// Source directory containing master calibration files
    source_dir: String,
    /// Destination directory for the organized calibration library
    dest_dir: String,
    /// Enable debug output
    #[arg(long)]
    debug: bool,
    /// Print actions without copying files
    #[arg(long, visible_alias = "dry-run")]
    dryrun: bool,
    /// Fail if any destination file already exists
    #[arg(long)]
    no_overwrite: bool,
}

fn main() {
    let args = Args::parse();

    let level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let options = Options {
        dry_run: args.dryrun,
        no_overwrite: args.no_overwrite,
        debug: args.debug,
    };

    if let Err(e) = organize(&args.source_dir, &args.dest_dir, options).map_err(anyhow::Error::from) {
        log::error!("{e}");
        if args.debug {
            log::error!("Full error chain: {e:?}");
        }
        std::process::exit(1);
    }
}
