use std::fs;
use std::io::{self};
use std::path::PathBuf;

use super::{
    args::{Args, RunMode},
    report, result,
    run::run_methods,
    settings::Settings,
    sweep::run_sweep,
    utils::plot,
};
use crate::init_logger;
use clap::{Command, CommandFactory};
use clap_complete::Generator;
use eyre::{Context, Result};
use tracing::{debug, info};

fn print_completions<G: Generator>(gen: G, cmd: &mut Command) {
    clap_complete::generate(gen, cmd, cmd.get_name().to_string(), &mut io::stdout());
}

pub fn main(args: Args) -> Result<()> {
    init_logger();
    let start_time = std::time::Instant::now();
    if let Some(generator) = args.generator {
        let mut cmd = Args::command();
        eprintln!("Generating completion file for {:?}...", generator);
        print_completions(generator, &mut cmd);
        return Ok(());
    }
    info!("start estimate with {:?}", args);

    let mut config_files = args.config_file;
    if config_files.is_empty() {
        config_files.push("configs/default.toml".into());
    }
    let mut settings = Settings::new(&config_files).wrap_err("fail to create Setting object")?;
    if args.plot_dir.is_some() {
        settings.plot_dir = args.plot_dir;
    }
    debug!("{:?}", settings);

    let run_mode = args.run_mode.unwrap_or(RunMode::Estimate);
    match run_mode {
        RunMode::Estimate => {
            info!("estimate start");
            let runs = run_methods(&settings);
            println!("\n{}", report::comparison_table(&runs.results.all));
            println!("{}", report::derived_table(&runs.results.all));

            let file_name = &settings.result_file;
            runs.results
                .save_to_file(file_name)
                .wrap_err("fail to save result")?;
            result::save_result_list(&runs.ok_list, &runs.err_list, file_name)
                .wrap_err("fail to save result list")?;
            fs::write(file_name.with_extension("arch.toml"), settings.arch.to_toml()?)
                .wrap_err("fail to save arch snapshot")?;

            if let Some(plot_dir) = &settings.plot_dir {
                if runs.results.all.is_empty() {
                    info!("no successful method, skip plotting");
                } else {
                    let charts = plot::plot_all(&runs.results.all, plot_dir)?;
                    info!("charts: {:?}", charts);
                }
            }
            info!("the list of methods succeeded: {:?}", runs.ok_list);
            info!("the list of methods failed: {:?}", runs.err_list);
        }
        RunMode::Sweep => {
            info!("sweep start");
            let rows = run_sweep(&settings.arch, &settings.sweep)?;
            println!("\n{}", report::sweep_table(&rows));
            let file_name: PathBuf = settings.result_file.with_extension("sweep.json");
            if let Some(parent) = file_name.parent() {
                fs::create_dir_all(parent)?;
            }
            serde_json::to_writer_pretty(
                fs::File::create(&file_name)
                    .wrap_err(format!("the path: {:?} is invalid!", file_name))?,
                &rows,
            )?;
        }
    }
    info!(
        "running time: {:?}'s",
        std::time::Instant::now()
            .duration_since(start_time)
            .as_secs_f64()
    );
    Ok(())
}
