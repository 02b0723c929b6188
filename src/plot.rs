use super::mode::{parse_selection, prompt_mode, Mode};
use super::{min_and_max, padded_range, BenchTable, ReportError, Result, VERSION, Y_DESC};
use clap::{value_t, App, Arg};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::ffi::OsString;
use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::process::{Child, Command};
use tracing::{debug, info, warn};

pub const STD_PLOT_PATH: &str = "./vector_api_test_plots/";

/// Where the x-axis column comes from
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ModeSource {
    /// ask on stdin once the data is loaded
    Prompt,
    Given(Option<Mode>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlotConfig {
    pub csvin: PathBuf,
    pub mode: ModeSource,
    pub output_dir: PathBuf,
    /// save into output_dir instead of opening a viewer
    pub save: bool,
    pub size: (u32, u32),
}

/// Takes the CLI arguments that control the plotting of the benchmark results.
pub fn parse_cli() -> PlotConfig {
    config_from_args(std::env::args_os()).unwrap_or_else(|e| e.exit())
}

pub fn config_from_args<I, T>(args: I) -> clap::Result<PlotConfig>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let arg_csvin = Arg::with_name("input_csvfile")
        .help("csv file with the benchmark results")
        .index(1)
        .required(true);
    let arg_mode = Arg::with_name("mode")
        .help("column on the x-axis: 1 = rows1, 2 = cols1, 3 = cols2, 4 = k; prompts if missing")
        .short("m")
        .long("mode")
        .takes_value(true);
    let arg_outdir = Arg::with_name("output_dir")
        .help("directory for the saved charts, created if missing")
        .short("d")
        .long("outdir")
        .takes_value(true)
        .default_value(STD_PLOT_PATH);
    let arg_save = Arg::with_name("save")
        .help("save the chart as svg in the output directory instead of showing it")
        .short("s")
        .long("save");
    let arg_width = Arg::with_name("width")
        .help("chart width in pixels")
        .long("width")
        .takes_value(true)
        .default_value("1600");
    let arg_height = Arg::with_name("height")
        .help("chart height in pixels")
        .long("height")
        .takes_value(true)
        .default_value("800");
    let cli_args = App::new("matmul_plot")
        .version(VERSION.unwrap_or("unknown"))
        .author("Luca Peruzzo")
        .about("cli app to plot scalar, SIMD and MKL matrix multiplication timings")
        .arg(arg_csvin)
        .arg(arg_mode)
        .arg(arg_outdir)
        .arg(arg_save)
        .arg(arg_width)
        .arg(arg_height)
        .get_matches_from_safe(args)?;

    let csvin = PathBuf::from(cli_args.value_of("input_csvfile").unwrap_or_default());
    let mode = match cli_args.value_of("mode") {
        Some(m) => ModeSource::Given(parse_selection(m)),
        None => ModeSource::Prompt,
    };
    let output_dir = PathBuf::from(cli_args.value_of("output_dir").unwrap_or(STD_PLOT_PATH));
    let width = value_t!(cli_args, "width", u32)?;
    let height = value_t!(cli_args, "height", u32)?;
    Ok(PlotConfig {
        csvin,
        mode,
        output_dir,
        save: cli_args.is_present("save"),
        size: (width, height),
    })
}

/// One line of the chart
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub label: &'static str,
    pub color: RGBColor,
    pub points: Vec<(f64, f64)>,
}

/// Everything needed to draw the chart, already detached from the table
#[derive(Debug, Clone, PartialEq)]
pub struct PlotData {
    pub title: String,
    pub x_desc: String,
    pub series: Vec<Series>,
}

impl PlotData {
    /// Scalar, SIMD and MKL timings against the mode column, in file order.
    /// Without a mode there is nothing to put on the x-axis and the chart stays blank.
    pub fn new(table: &BenchTable, mode: Option<Mode>, title: String) -> PlotData {
        let mode = match mode {
            Some(m) => m,
            None => {
                return PlotData {
                    title,
                    x_desc: String::new(),
                    series: Vec::new(),
                }
            }
        };
        let x = mode.column(table);
        let series = vec![
            ("Scalar Mult", RED, &table.time_scalar),
            ("SIMD Mult", BLUE, &table.time_simd),
            ("MKL Mult", GREEN, &table.time_mkl),
        ]
        .into_iter()
        .map(|(label, color, y)| Series {
            label,
            color,
            points: x.iter().zip(y.iter()).map(|(&xv, &yv)| (xv as f64, yv)).collect(),
        })
        .collect();
        PlotData {
            title,
            x_desc: mode.x_desc(),
            series,
        }
    }

    /// axis ranges over the finite points only
    fn ranges(&self) -> (Range<f64>, Range<f64>) {
        let points = || {
            self.series
                .iter()
                .flat_map(|s| s.points.iter())
                .filter(|p| is_drawable(p))
        };
        let xrange = padded_range(min_and_max(points().map(|p| p.0)));
        let yrange = padded_range(min_and_max(points().map(|p| p.1)));
        (xrange, yrange)
    }

    pub fn render_svg(&self, size: (u32, u32)) -> Result<String> {
        let mut svg = String::new();
        self.draw(SVGBackend::with_string(&mut svg, size).into_drawing_area())
            .map_err(|e| ReportError::Plot(e.to_string()))?;
        Ok(svg)
    }

    fn draw(
        &self,
        root: DrawingArea<SVGBackend, Shift>,
    ) -> std::result::Result<(), Box<dyn std::error::Error>> {
        let (xrange, yrange) = self.ranges();
        root.fill(&WHITE)?;
        let mut chart = ChartBuilder::on(&root)
            .caption(&self.title, ("sans-serif", 30))
            .margin(20)
            .x_label_area_size(60)
            .y_label_area_size(100)
            .build_cartesian_2d(xrange, yrange)?;
        chart
            .configure_mesh()
            .light_line_style(&TRANSPARENT)
            .bold_line_style(RGBColor(150, 150, 150).stroke_width(2))
            .set_all_tick_mark_size(2)
            .label_style(("sans-serif", 24))
            .x_desc(self.x_desc.as_str())
            .y_desc(Y_DESC)
            .x_label_formatter(&|x: &f64| format!("{:.0}", x))
            .y_label_formatter(&|y: &f64| format!("{:5}", y))
            .draw()?;

        // NAN and infinite timings leave a gap in the line
        for s in self.series.iter() {
            let color = s.color;
            let mut labelled = false;
            for chunk in s.points.split(|p| !is_drawable(p)) {
                if chunk.is_empty() {
                    continue;
                }
                let anno = chart.draw_series(LineSeries::new(
                    chunk.iter().copied(),
                    color.stroke_width(3),
                ))?;
                if !labelled {
                    anno.label(s.label).legend(move |(x, y)| {
                        PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(3))
                    });
                    labelled = true;
                }
            }
        }
        if !self.series.is_empty() {
            chart
                .configure_series_labels()
                .label_font(("sans-serif", 20))
                .background_style(&WHITE.mix(0.8))
                .border_style(&BLACK)
                .draw()?;
        }
        root.present()?;
        Ok(())
    }
}

fn is_drawable(p: &(f64, f64)) -> bool {
    p.0.is_finite() && p.1.is_finite()
}

/// input file name with the svg extension appended, e.g. bench.csv -> bench.csv.svg
pub fn chart_file_name(csvin: &Path) -> PathBuf {
    let mut name = csvin
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| OsString::from("chart"));
    name.push(".svg");
    PathBuf::from(name)
}

fn open_viewer(path: &Path) -> std::io::Result<Child> {
    #[cfg(target_os = "macos")]
    let mut cmd = Command::new("open");
    #[cfg(target_os = "windows")]
    let mut cmd = {
        let mut c = Command::new("cmd");
        c.args(&["/C", "start", ""]);
        c
    };
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    let mut cmd = Command::new("xdg-open");
    cmd.arg(path).spawn()
}

/// Load, plot, and show or save; returns the path of the written svg.
/// Without `save` the svg is written to the system temp directory for the viewer
/// and is left there after the run.
pub fn run(cfg: &PlotConfig) -> Result<PathBuf> {
    let table = BenchTable::from_csv(&cfg.csvin)?;
    info!("read {} records from {}", table.len(), cfg.csvin.display());
    debug!("\n{}", table);

    fs::create_dir_all(&cfg.output_dir)?;

    let mode = match cfg.mode {
        ModeSource::Given(m) => m,
        ModeSource::Prompt => {
            let stdin = std::io::stdin();
            let stdout = std::io::stdout();
            prompt_mode(&mut stdin.lock(), &mut stdout.lock())?
        }
    };
    match mode {
        Some(m) => info!("plotting against {}", m.header()),
        None => warn!("no valid mode selected, rendering an empty chart"),
    }

    let data = PlotData::new(&table, mode, format!("file = {}", cfg.csvin.display()));
    let svg = data.render_svg(cfg.size)?;

    if cfg.save {
        let fout = cfg.output_dir.join(chart_file_name(&cfg.csvin));
        fs::write(&fout, svg)?;
        info!("saved chart to {}", fout.display());
        Ok(fout)
    } else {
        let fout = std::env::temp_dir().join(chart_file_name(&cfg.csvin));
        fs::write(&fout, svg)?;
        match open_viewer(&fout) {
            Ok(_) => info!("opened {}", fout.display()),
            Err(e) => warn!("could not open a viewer ({}), the chart is at {}", e, fout.display()),
        }
        Ok(fout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn example_table() -> BenchTable {
        BenchTable {
            rows1: vec![100, 200],
            cols1: vec![4, 8],
            cols2: vec![16, 32],
            k: vec![1, 2],
            time_scalar: vec![12.5, 25.0],
            time_simd: vec![3.2, 6.1],
            time_mkl: vec![1.1, 2.0],
            improvement: vec![11.4, 12.5],
        }
    }

    fn xs(s: &Series) -> Vec<f64> {
        s.points.iter().map(|p| p.0).collect()
    }

    fn ys(s: &Series) -> Vec<f64> {
        s.points.iter().map(|p| p.1).collect()
    }

    #[test]
    fn three_series_against_rows1() {
        let data = PlotData::new(&example_table(), Some(Mode::Rows1), "file = t.csv".to_string());
        assert_eq!(data.x_desc, "rows1= rows of LHS matrix");
        let labels: Vec<&str> = data.series.iter().map(|s| s.label).collect();
        assert_eq!(labels, vec!["Scalar Mult", "SIMD Mult", "MKL Mult"]);
        assert_eq!(data.series[0].color, RED);
        assert_eq!(data.series[1].color, BLUE);
        assert_eq!(data.series[2].color, GREEN);
        for s in data.series.iter() {
            assert_eq!(xs(s), vec![100., 200.]);
        }
        assert_eq!(ys(&data.series[0]), vec![12.5, 25.0]);
        assert_eq!(ys(&data.series[1]), vec![3.2, 6.1]);
        assert_eq!(ys(&data.series[2]), vec![1.1, 2.0]);
    }

    #[test]
    fn every_mode_uses_its_column() {
        let table = example_table();
        for mode in Mode::ALL.iter().copied() {
            let data = PlotData::new(&table, Some(mode), String::new());
            let expected: Vec<f64> = mode.column(&table).iter().map(|&v| v as f64).collect();
            assert_eq!(xs(&data.series[0]), expected);
        }
    }

    #[test]
    fn no_mode_no_series() {
        let data = PlotData::new(&example_table(), None, String::new());
        assert!(data.series.is_empty());
        assert_eq!(data.x_desc, "");
        assert_eq!(data.ranges(), (0.0..1.0, 0.0..1.0));
    }

    #[test]
    fn ranges_cover_all_series() {
        let data = PlotData::new(&example_table(), Some(Mode::Rows1), String::new());
        let (xrange, yrange) = data.ranges();
        assert_eq!(xrange, 90.0..210.0);
        assert!(yrange.start < 1.1 && yrange.end > 25.0);
    }

    #[test]
    fn non_finite_points_stay_out_of_the_ranges() {
        let mut table = example_table();
        table.time_scalar = vec![f64::NAN, 25.0];
        table.time_simd = vec![3.2, f64::INFINITY];
        let data = PlotData::new(&table, Some(Mode::Rows1), String::new());
        assert_eq!(xs(&data.series[0]), vec![100., 200.]);
        let (xrange, yrange) = data.ranges();
        assert_eq!(xrange, 90.0..210.0);
        assert!(yrange.start.is_finite() && yrange.end.is_finite());
        assert!(yrange.start < 1.1 && yrange.end > 25.0);
    }

    #[test]
    fn renders_single_row_with_caption_and_legend() {
        let table = BenchTable {
            rows1: vec![100],
            cols1: vec![4],
            cols2: vec![4],
            k: vec![1],
            time_scalar: vec![12.5],
            time_simd: vec![3.2],
            time_mkl: vec![1.1],
            improvement: vec![11.4],
        };
        let data = PlotData::new(&table, Some(Mode::Rows1), "file = bench.csv".to_string());
        let svg = data.render_svg((800, 400)).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("file = bench.csv"));
        assert!(svg.contains("Scalar Mult"));
        assert!(svg.contains("SIMD Mult"));
        assert!(svg.contains("MKL Mult"));
        assert!(svg.contains(Y_DESC));
    }

    #[test]
    fn renders_blank_chart_without_mode() {
        let data = PlotData::new(&example_table(), None, "file = bench.csv".to_string());
        let svg = data.render_svg((800, 400)).unwrap();
        assert!(svg.contains("file = bench.csv"));
        assert!(!svg.contains("Scalar Mult"));
    }

    #[test]
    fn renders_with_nan_and_inf_timings() {
        let mut table = example_table();
        table.time_scalar = vec![f64::NAN, 25.0];
        table.time_simd = vec![f64::INFINITY, 6.1];
        table.time_mkl = vec![f64::NEG_INFINITY, f64::NAN];
        let data = PlotData::new(&table, Some(Mode::Rows1), "file = bench.csv".to_string());
        let svg = data.render_svg((800, 400)).unwrap();
        assert!(svg.contains("Scalar Mult"));
        assert!(svg.contains("SIMD Mult"));
        // no finite MKL point, nothing to draw or label
        assert!(!svg.contains("MKL Mult"));
    }

    #[test]
    fn cli_defaults() {
        let cfg = config_from_args(vec!["matmul_plot", "bench.csv"]).unwrap();
        assert_eq!(cfg.csvin, PathBuf::from("bench.csv"));
        assert_eq!(cfg.mode, ModeSource::Prompt);
        assert_eq!(cfg.output_dir, PathBuf::from(STD_PLOT_PATH));
        assert!(!cfg.save);
        assert_eq!(cfg.size, (1600, 800));
    }

    #[test]
    fn cli_flags() {
        let cfg = config_from_args(vec![
            "matmul_plot", "bench.csv", "-m", "4", "-d", "plots", "--save", "--width", "800",
        ])
        .unwrap();
        assert_eq!(cfg.mode, ModeSource::Given(Some(Mode::Threads)));
        assert_eq!(cfg.output_dir, PathBuf::from("plots"));
        assert!(cfg.save);
        assert_eq!(cfg.size, (800, 800));

        let cfg = config_from_args(vec!["matmul_plot", "bench.csv", "--mode", "5"]).unwrap();
        assert_eq!(cfg.mode, ModeSource::Given(None));
    }

    #[test]
    fn cli_rejects_missing_input_and_bad_size() {
        assert!(config_from_args(vec!["matmul_plot"]).is_err());
        assert!(config_from_args(vec!["matmul_plot", "b.csv", "--width", "wide"]).is_err());
    }

    #[test]
    fn chart_name_from_input() {
        assert_eq!(chart_file_name(Path::new("dir/bench.csv")), PathBuf::from("bench.csv.svg"));
    }
}
