use emg_plot::plot::{parse_cli, PlotCli};
use emg_plot::{plot_all_recordings, plot_emg_trace, EmgResult, EmgTable};
use tracing::info;

fn main() {
    let cli = match parse_cli() {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    };
    emg_plot::init_tracing(cli.verbose);
    if let Err(e) = run(&cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: &PlotCli) -> EmgResult<()> {
    if cli.info {
        let table = EmgTable::from_csv(&cli.csvin, &cli.options.stim_col)?;
        println!("{}", table.summary(&file_name(cli)));
        return Ok(());
    }
    if cli.all_recordings {
        info!(
            "read data from {} and plot every recording next to {}",
            cli.csvin.display(),
            cli.fout.display()
        );
        let reports = plot_all_recordings(&cli.csvin, &cli.options, &cli.fout)?;
        for report in &reports {
            for f in &report.files {
                println!("Saved: {}", f.display());
            }
        }
        return Ok(());
    }
    if !cli.explicit_output {
        return show_or_save_default(cli);
    }
    save(cli)
}

fn save(cli: &PlotCli) -> EmgResult<()> {
    info!(
        "read data from {} and plot to {}",
        cli.csvin.display(),
        cli.fout.display()
    );
    let report = plot_emg_trace(&cli.csvin, &cli.options, &cli.fout)?;
    for f in &report.files {
        println!("Saved: {}", f.display());
    }
    Ok(())
}

/// Without `-o` the figure is shown in a window.
#[cfg(feature = "gui")]
fn show_or_save_default(cli: &PlotCli) -> EmgResult<()> {
    info!("read data from {} and show it", cli.csvin.display());
    let table = EmgTable::from_csv(&cli.csvin, &cli.options.stim_col)?;
    let figure = emg_plot::Figure::build(&table, &cli.options)?;
    emg_plot::gui::show_figure(&file_name(cli), &figure, &cli.options)
}

/// Headless builds write `<csv>.png`, but never over an existing file.
#[cfg(not(feature = "gui"))]
fn show_or_save_default(cli: &PlotCli) -> EmgResult<()> {
    cli.check_default_output()?;
    save(cli)
}

fn file_name(cli: &PlotCli) -> String {
    cli.csvin
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
