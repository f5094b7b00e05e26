use anyhow::{bail, Context, Result};
use beamfold::checker;
use beamfold::component::{ComponentId, Port};
use beamfold::fold::{calculate, calculate_with_count, Endpoint};
use beamfold::geom::Point2;
use beamfold::physics::validate_connection;
use beamfold::propagate::EditRequest;
use beamfold::{EngineCfg, Layout};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing_subscriber::fmt::SubscriberBuilder;

mod provenance;

use provenance::Sidecar;

#[derive(Parser)]
#[command(name = "beamfold")]
#[command(about = "Check, solve and edit optical bench layouts")]
struct Cmd {
    /// JSON file with engine tolerance overrides; missing fields keep defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand)]
enum Action {
    /// Validate a prospective beam segment between two components
    Check {
        #[arg(long)]
        layout: PathBuf,
        #[arg(long)]
        source: String,
        #[arg(long)]
        target: String,
        #[arg(long, value_enum, default_value_t = PortArg::Output)]
        port: PortArg,
    },
    /// Solve fold points between two poses given as x,y,angle
    Fold {
        #[arg(long)]
        from: Pose,
        #[arg(long)]
        to: Pose,
        #[arg(long)]
        length: f64,
        /// Force a fold count instead of deriving it from the angles
        #[arg(long)]
        folds: Option<u8>,
    },
    /// List beam paths leaving a component
    Trace {
        #[arg(long)]
        layout: PathBuf,
        #[arg(long)]
        source: String,
        #[arg(long)]
        max_depth: Option<usize>,
    },
    /// Move a component to x,y and write the resulting layout
    Move {
        #[arg(long)]
        layout: PathBuf,
        #[arg(long)]
        component: String,
        /// Target position as x,y
        #[arg(long, value_parser = parse_point)]
        to: Point2,
        #[arg(long)]
        out: PathBuf,
    },
    /// Rotate a component to an absolute angle and write the resulting layout
    Rotate {
        #[arg(long)]
        layout: PathBuf,
        #[arg(long)]
        component: String,
        #[arg(long)]
        angle: f64,
        #[arg(long)]
        out: PathBuf,
    },
    /// Print constraint violations and path totals as JSON
    Report {
        #[arg(long)]
        layout: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum PortArg {
    Output,
    Reflected,
    Transmitted,
}

impl From<PortArg> for Port {
    fn from(p: PortArg) -> Self {
        match p {
            PortArg::Output => Port::Output,
            PortArg::Reflected => Port::Reflected,
            PortArg::Transmitted => Port::Transmitted,
        }
    }
}

/// `x,y,angle` from the command line.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Pose {
    position: Point2,
    angle: f64,
}

fn parse_numbers(s: &str) -> Result<Vec<f64>, String> {
    s.split(',')
        .map(|p| p.trim().parse::<f64>().map_err(|e| format!("'{p}': {e}")))
        .collect()
}

impl FromStr for Pose {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let nums = parse_numbers(s)?;
        match nums[..] {
            [x, y, angle] => Ok(Pose {
                position: Point2::new(x, y),
                angle,
            }),
            _ => Err(format!("expected x,y,angle, got '{s}'")),
        }
    }
}

/// Strict `x,y` for positions.
fn parse_point(s: &str) -> Result<Point2, String> {
    let nums = parse_numbers(s)?;
    match nums[..] {
        [x, y] => Ok(Point2::new(x, y)),
        _ => Err(format!("expected x,y, got '{s}'")),
    }
}

impl From<Pose> for Endpoint {
    fn from(p: Pose) -> Self {
        Endpoint::new(p.position, p.angle)
    }
}

fn main() -> Result<()> {
    SubscriberBuilder::default().with_target(false).init();
    let cmd = Cmd::parse();
    let cfg = load_cfg(cmd.config.as_deref())?;
    match cmd.action {
        Action::Check {
            layout,
            source,
            target,
            port,
        } => check(&layout, &source, &target, port.into(), &cfg),
        Action::Fold {
            from,
            to,
            length,
            folds,
        } => fold(from, to, length, folds, &cfg),
        Action::Trace {
            layout,
            source,
            max_depth,
        } => trace(&layout, &source, max_depth.unwrap_or(cfg.max_trace_depth)),
        Action::Move {
            layout,
            component,
            to,
            out,
        } => edit(
            &layout,
            EditRequest::translate(component, to),
            &out,
            &cfg,
        ),
        Action::Rotate {
            layout,
            component,
            angle,
            out,
        } => edit(&layout, EditRequest::rotate(component, angle), &out, &cfg),
        Action::Report { layout } => report(&layout, &cfg),
    }
}

fn load_cfg(path: Option<&Path>) -> Result<EngineCfg> {
    let Some(path) = path else {
        return Ok(EngineCfg::default());
    };
    let bytes = std::fs::read(path).with_context(|| format!("reading config {}", path.display()))?;
    let cfg = serde_json::from_slice(&bytes)
        .with_context(|| format!("parsing config {}", path.display()))?;
    tracing::info!(config = %path.display(), "loaded engine config");
    Ok(cfg)
}

fn load_layout(path: &Path) -> Result<Layout> {
    let bytes = std::fs::read(path).with_context(|| format!("reading layout {}", path.display()))?;
    let layout: Layout = serde_json::from_slice(&bytes)
        .with_context(|| format!("parsing layout {}", path.display()))?;
    tracing::info!(
        layout = %path.display(),
        components = layout.components.len(),
        segments = layout.graph.len(),
        "loaded layout"
    );
    Ok(layout)
}

fn write_layout(layout: &Layout, out: &Path) -> Result<()> {
    if let Some(parent) = out.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(out, serde_json::to_vec_pretty(layout)?)
        .with_context(|| format!("writing {}", out.display()))
}

fn check(layout: &Path, source: &str, target: &str, port: Port, cfg: &EngineCfg) -> Result<()> {
    let l = load_layout(layout)?;
    let source = ComponentId::from(source);
    let incoming = l.graph.incoming_angle(&source);
    let res = validate_connection(&l.components, &source, &target.into(), port, incoming, cfg);
    tracing::info!(%source, target, valid = res.valid, "check");
    println!("{}", serde_json::to_string_pretty(&res)?);
    Ok(())
}

fn fold(from: Pose, to: Pose, length: f64, folds: Option<u8>, cfg: &EngineCfg) -> Result<()> {
    let geom = match folds {
        Some(n) => calculate_with_count(from.into(), to.into(), length, n, cfg),
        None => calculate(from.into(), to.into(), length, cfg),
    };
    tracing::info!(
        fold_count = geom.fold_count,
        valid = geom.valid,
        length,
        "fold"
    );
    let angles = geom.mirror_angles();
    println!(
        "{}",
        serde_json::to_string_pretty(&json!({ "geometry": geom, "mirrorAngles": angles }))?
    );
    Ok(())
}

fn trace(layout: &Path, source: &str, max_depth: usize) -> Result<()> {
    let l = load_layout(layout)?;
    let source = ComponentId::from(source);
    l.component(&source)?;
    let paths: Vec<_> = l
        .graph
        .trace_from_source(&source, max_depth)
        .into_iter()
        .map(|p| {
            let length = l.graph.path_length(&p);
            json!({ "segments": p, "length": length })
        })
        .collect();
    tracing::info!(%source, max_depth, paths = paths.len(), "trace");
    println!("{}", serde_json::to_string_pretty(&paths)?);
    Ok(())
}

fn edit(layout: &Path, req: EditRequest, out: &Path, cfg: &EngineCfg) -> Result<()> {
    let l = load_layout(layout)?;
    let outcome = l.edit_or_keep(&req, cfg);
    if let Some(err) = outcome.error {
        bail!("edit of '{}' rejected: {err}", req.component);
    }
    write_layout(&outcome.layout, out)?;
    let command = match req.motion {
        beamfold::propagate::Motion::Translate(_) => "move",
        beamfold::propagate::Motion::Rotate(_) => "rotate",
    };
    let params = json!({ "component": req.component, "motion": format!("{:?}", req.motion) });
    let sidecar = Sidecar::new(command, layout, out, params).write()?;
    tracing::info!(
        component = %req.component,
        out = %out.display(),
        sidecar = %sidecar.display(),
        "edit written"
    );
    Ok(())
}

fn report(layout: &Path, cfg: &EngineCfg) -> Result<()> {
    let l = load_layout(layout)?;
    let r = checker::report(&l, cfg);
    tracing::info!(
        violations = r.violations.len(),
        invalid_segments = r.invalid_segments.len(),
        "report"
    );
    println!("{}", serde_json::to_string_pretty(&r)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use beamfold::component::{Component, ComponentKind};
    use beamfold::segment::SegmentIdGen;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn pose_needs_three_fields() {
        assert_eq!(
            "1, 2, 90".parse::<Pose>().unwrap(),
            Pose {
                position: Point2::new(1.0, 2.0),
                angle: 90.0
            }
        );
        assert!("1,2".parse::<Pose>().is_err());
        assert!("1,x,0".parse::<Pose>().is_err());
    }

    #[test]
    fn move_target_rejects_an_angle() {
        assert_eq!(parse_point("3, 4").unwrap(), Point2::new(3.0, 4.0));
        assert!(parse_point("3,4,90").is_err());
        let parsed = Cmd::try_parse_from([
            "beamfold", "move", "--layout", "l.json", "--component", "m1", "--to", "3,4,90", "--out",
            "o.json",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cfg.json");
        fs::write(&path, r#"{"angle_tol_deg": 2.0}"#).unwrap();
        let cfg = load_cfg(Some(&path)).unwrap();
        assert_eq!(cfg.angle_tol_deg, 2.0);
        assert_eq!(cfg.max_trace_depth, EngineCfg::default().max_trace_depth);
        assert_eq!(load_cfg(None).unwrap(), EngineCfg::default());
    }

    fn write_bench(dir: &Path) -> PathBuf {
        let cfg = EngineCfg::default();
        let l = Layout::new()
            .with_component(Component::new(
                "src",
                ComponentKind::Source { power: 1.0 },
                Point2::new(100.0, 100.0),
                0.0,
            ))
            .with_component(Component::new(
                "det",
                ComponentKind::Detector,
                Point2::new(400.0, 100.0),
                0.0,
            ));
        let (l, _) = l
            .connect(&"src".into(), &"det".into(), Port::Output, &mut SegmentIdGen::default(), &cfg)
            .unwrap();
        let path = dir.join("bench.json");
        write_layout(&l, &path).unwrap();
        path
    }

    #[test]
    fn move_writes_layout_and_sidecar() {
        let dir = tempdir().unwrap();
        let input = write_bench(dir.path());
        let out = dir.path().join("edits").join("moved.json");
        let req = EditRequest::translate("det", Point2::new(500.0, 100.0));
        edit(&input, req, &out, &EngineCfg::default()).unwrap();

        let moved = load_layout(&out).unwrap();
        let seg = moved.graph.segments().next().unwrap();
        assert!((seg.path_length - 400.0).abs() < 1e-9);
        let sidecar: serde_json::Value =
            serde_json::from_slice(&fs::read(dir.path().join("edits").join("moved.provenance.json")).unwrap())
                .unwrap();
        assert_eq!(sidecar["command"], "move");
        assert_eq!(sidecar["params"]["component"], "det");
    }

    #[test]
    fn rejected_edit_writes_nothing() {
        let dir = tempdir().unwrap();
        let input = write_bench(dir.path());
        let out = dir.path().join("rotated.json");
        let req = EditRequest::rotate("ghost", 90.0);
        let err = edit(&input, req, &out, &EngineCfg::default()).unwrap_err();
        assert!(err.to_string().contains("ghost"));
        assert!(!out.exists());
    }
}
