//! Static charts of heating curves and fits
//!
//! The backend follows the file extension: `.svg` gives a vector image, anything
//! else a bitmap.

use std::error::Error;
use std::path::Path;

use plotters::coord::Shift;
use plotters::prelude::*;

use crate::output::visualization::PlotConfig;
use crate::physics::HeatingCurve;
use crate::tasks::FitResult;

/// Axis ranges covering every series, with a 10% margin on the vertical axis
fn ranges(time: &[f64], series: &[&[f64]]) -> Result<(f64, f64, f64, f64), Box<dyn Error>> {
    let t_min = time.iter().copied().fold(f64::INFINITY, f64::min);
    let t_max = time.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
    for values in series {
        for &y in values.iter() {
            y_min = y_min.min(y);
            y_max = y_max.max(y);
        }
    }
    if !(t_min.is_finite() && t_max.is_finite() && y_min.is_finite() && y_max.is_finite()) {
        return Err("nothing to plot".into());
    }
    let spread = (y_max - y_min).max(1e-12);
    let t_max = if t_max > t_min { t_max } else { t_min + 1.0 };
    Ok((t_min, t_max, y_min - 0.1 * spread, y_max + 0.1 * spread))
}

fn draw_on_area<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    time: &[f64],
    data: Option<&[f64]>,
    model: (&[f64], &[f64]),
    config: &PlotConfig,
) -> Result<(), Box<dyn Error>>
where
    <DB as DrawingBackend>::ErrorType: 'static,
{
    let mut series: Vec<&[f64]> = vec![model.1];
    if let Some(data) = data {
        series.push(data);
    }
    let all_time: Vec<f64> = time.iter().chain(model.0).copied().collect();
    let (t_min, t_max, y_min, y_max) = ranges(&all_time, &series)?;

    root.fill(&config.background)?;

    let mut chart = ChartBuilder::on(root)
        .caption(&config.title, ("sans-serif", 40).into_font())
        .margin(15)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(t_min..t_max, y_min..y_max)?;

    let mut mesh = chart.configure_mesh();
    mesh.x_desc(&config.xlabel).y_desc(&config.ylabel);
    if config.show_grid {
        mesh.draw()?;
    } else {
        mesh.disable_mesh().draw()?;
    }

    if let Some(data) = data {
        let color = config.data_color;
        let size = config.point_size;
        chart
            .draw_series(
                time.iter()
                    .zip(data)
                    .map(|(&t, &y)| Circle::new((t, y), size, color.filled())),
            )?
            .label("Experiment")
            .legend(move |(x, y)| Circle::new((x + 10, y), size, color.filled()));
    }

    let color = config.model_color;
    let width = config.line_width;
    chart
        .draw_series(LineSeries::new(
            model.0.iter().zip(model.1).map(|(&t, &y)| (t, y)),
            color.stroke_width(width),
        ))?
        .label("Model")
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(width)));

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::LowerRight)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

fn render(
    path: &Path,
    time: &[f64],
    data: Option<&[f64]>,
    model: (&[f64], &[f64]),
    config: &PlotConfig,
) -> Result<(), Box<dyn Error>> {
    let size = (config.width, config.height);
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("svg") => draw_on_area(&SVGBackend::new(path, size).into_drawing_area(), time, data, model, config),
        _ => draw_on_area(&BitMapBackend::new(path, size).into_drawing_area(), time, data, model, config),
    }
}

/// Chart of a solution
pub fn plot_heating_curve(
    curve: &HeatingCurve,
    path: &Path,
    config: Option<&PlotConfig>,
) -> Result<(), Box<dyn Error>> {
    let default = PlotConfig::default();
    let config = config.unwrap_or(&default);
    render(path, &[], None, (curve.times(), curve.temperatures()), config)
}

/// Experimental points of the fitting window against the fitted model
pub fn plot_fit(result: &FitResult, path: &Path, config: Option<&PlotConfig>) -> Result<(), Box<dyn Error>> {
    let default = PlotConfig::fit("Fit");
    let config = config.unwrap_or(&default);
    let model = result.model();
    render(path, &result.time, Some(&result.signal), (&result.time, &model), config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use tempfile::NamedTempFile;

    fn curve() -> HeatingCurve {
        let mut curve = HeatingCurve::new(50);
        curve.reset();
        for i in 1..50 {
            let t = i as f64 * 0.02;
            curve.add_point(t, 1.0 - (-3.0 * t).exp());
        }
        curve
    }

    #[test]
    fn test_ranges_add_margin() {
        let (t0, t1, y0, y1) = ranges(&[0.0, 2.0], &[&[0.0, 1.0]]).unwrap();
        assert_eq!((t0, t1), (0.0, 2.0));
        assert_relative_eq!(y0, -0.1);
        assert_relative_eq!(y1, 1.1);
        assert!(ranges(&[], &[]).is_err());
    }

    #[test]
    fn test_plot_heating_curve_png() {
        let tmp = NamedTempFile::new().unwrap();
        let path = tmp.path().with_extension("png");
        plot_heating_curve(&curve(), &path, None).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_plot_heating_curve_svg() {
        let tmp = NamedTempFile::new().unwrap();
        let path = tmp.path().with_extension("svg");
        let config = PlotConfig::fit("Rear face").without_grid();
        plot_heating_curve(&curve(), &path, Some(&config)).unwrap();
        assert!(path.exists());
    }
}
