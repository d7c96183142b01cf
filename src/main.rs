use clap::Parser;
use std::path::PathBuf;
use stepview::config::{self, Config};
use stepview::session::{Session, SessionStatus};
use stepview::ui::notefield::Surface;

#[derive(Debug, Parser)]
#[command(name = "stepview")]
#[command(about = "Replay the life bar of a step chart and export its annotations")]
struct Args {
    /// Chart payload (JSON)
    chart: PathBuf,

    /// Mark the arrow at this time (seconds) as missed; repeatable
    #[arg(long = "miss", value_name = "SECONDS")]
    misses: Vec<f64>,

    /// Pin the reference life at this percent until the first miss
    #[arg(long, value_name = "PERCENT", value_parser = clap::value_parser!(u8).range(0..=100))]
    freeze: Option<u8>,

    /// Write <chart_id>.json into this directory
    #[arg(long = "export", value_name = "DIR")]
    export_dir: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Install logger immediately, then set runtime max level from config after loading it.
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Trace)
        .try_init();
    // Startup default when config is missing or malformed.
    log::set_max_level(log::LevelFilter::Warn);

    let args = Args::parse();
    let cfg = Config::load(&config::config_path());
    log::set_max_level(cfg.log_level.as_level_filter());

    let chart_id = args
        .chart
        .file_stem()
        .map_or_else(|| "chart".to_owned(), |s| s.to_string_lossy().into_owned());

    let mut session = Session::new(cfg, Surface::headless());
    if !session.load_file(&chart_id, &args.chart) {
        if let SessionStatus::Error(e) = session.status() {
            return Err(format!("{}: {e}", args.chart.display()).into());
        }
        return Err(format!("{}: load failed", args.chart.display()).into());
    }
    for t in &args.misses {
        session.view().add_miss(*t);
    }
    if let Some(pct) = args.freeze {
        session.set_freeze_percent(pct);
    }

    let misses = session.view().unique_miss_count();
    if let Some(s) = session.life_summary() {
        println!("chart:      {chart_id}");
        println!("misses:     {misses}");
        println!("life max:   {:.1}", s.life_max);
        println!("final life: {:.1}", s.final_life);
        println!("min life:   {:.1}", s.min_life);
        match s.fail_time {
            Some(t) => println!("failed at:  {t:.3}s"),
            None => println!("failed at:  -"),
        }
    }

    if let Some(dir) = args.export_dir {
        let path = session.export()?.write_to(&dir)?;
        println!("exported:   {}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::Args;
    use clap::Parser;
    use std::path::PathBuf;

    #[test]
    fn parses_repeated_misses_and_options() {
        let a = Args::try_parse_from([
            "stepview", "c.json", "--miss", "1.5", "--miss", "2", "--freeze", "40", "--export", "out",
        ])
        .expect("valid arguments");
        assert_eq!(a.chart, PathBuf::from("c.json"));
        assert_eq!(a.misses, vec![1.5, 2.0]);
        assert_eq!(a.freeze, Some(40));
        assert_eq!(a.export_dir, Some(PathBuf::from("out")));
    }

    #[test]
    fn rejects_bad_input() {
        assert!(Args::try_parse_from(["stepview"]).is_err());
        assert!(Args::try_parse_from(["stepview", "c.json", "--miss"]).is_err());
        assert!(Args::try_parse_from(["stepview", "c.json", "--miss", "soon"]).is_err());
        assert!(Args::try_parse_from(["stepview", "c.json", "--freeze", "101"]).is_err());
        assert!(Args::try_parse_from(["stepview", "c.json", "--loud", "1"]).is_err());
    }

    #[test]
    fn argument_definitions_are_consistent() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}
