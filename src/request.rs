// SPDX: CC0-1.0

//! Plot requests and their responses, and the engine that serves them.

use crate::{
    algebra::{Algebra, TreeAlgebra},
    analysis::{self, AnalysisReport},
    config::Config,
    eval::{Function, FunctionErr},
    field::{nested, ValueField},
    plane::{CoordinatePlane, PlaneErr},
    project::{self, PlaneKind},
    zeta::{self, EulerMaclaurin, ZetaErr, ZetaEvaluator, ZetaPrimitive},
    Number, Polyline,
};
use core::{fmt, str::FromStr};
use serde::{Deserialize, Serialize};

/// Status reported with every rejected request.
pub const BAD_REQUEST: u16 = 400;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlotType {
    /// Riemann zeta, with critical line and zeros.
    Zeta,
    /// A user expression, optionally analyzed.
    GeneralFunc,
    #[default]
    SimpleFunc,
}

impl PlotType {
    pub const fn exhaustive() -> &'static [PlotType] {
        &[Self::Zeta, Self::GeneralFunc, Self::SimpleFunc]
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::Zeta => "zeta",
            Self::GeneralFunc => "general_func",
            Self::SimpleFunc => "simple_func",
        }
    }
}

impl fmt::Display for PlotType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PlotType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::exhaustive()
            .iter()
            .find(|t| t.name() == s)
            .copied()
            .ok_or_else(|| {
                let names: Vec<&str> = Self::exhaustive().iter().map(|t| t.name()).collect();
                format!("unknown plot type '{s}', expected one of {}", names.join(", "))
            })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotRequest {
    pub plot_type: PlotType,
    pub plane: PlaneKind,
    pub tau_min: Number,
    pub tau_max: Number,
    /// Samples per axis before the band around 0 is cut out.
    pub points: usize,
    pub function: String,
    pub analyze: bool,
    #[serde(alias = "liminal_radius")]
    pub interest_radius: Number,
    /// Zone circle radius; 10·delta when absent.
    pub epsilon: Option<Number>,
    pub num_zeros: usize,
    pub t_max_crit: Number,
}

impl Default for PlotRequest {
    fn default() -> Self {
        Self {
            plot_type: PlotType::default(),
            plane: PlaneKind::default(),
            tau_min: -3.0,
            tau_max: 3.0,
            points: 100,
            function: "z*z".to_string(),
            analyze: false,
            interest_radius: 1.0,
            epsilon: None,
            num_zeros: 5,
            t_max_crit: 50.0,
        }
    }
}

pub type Nested<T> = Vec<Vec<T>>;

#[derive(Clone, Debug, Serialize)]
pub struct PlotResponse {
    pub tau_x: Vec<Number>,
    pub tau_y: Vec<Number>,
    #[serde(rename = "type")]
    pub plot_type: PlotType,
    pub plane: PlaneKind,
    pub interest_radius: Number,
    pub zone_radius: Number,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interest_mask: Option<Nested<u8>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone_mask: Option<Nested<u8>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub w_x: Option<Nested<Number>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub w_y: Option<Nested<Number>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub critical_line: Option<Polyline>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zeros: Option<Polyline>,
    pub boundary_circle: Polyline,
    pub zone_circle: Polyline,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<AnalysisReport>,
    pub phase: Nested<Number>,
    pub magnitude: Nested<Number>,
    pub log_magnitude: Nested<Number>,
    pub real_part: Nested<Number>,
    pub imag_part: Nested<Number>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub status: u16,
}

#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum Response {
    Plot(Box<PlotResponse>),
    Error(ErrorResponse),
}

impl Response {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

#[derive(Debug)]
pub enum RequestErr {
    Malformed(serde_json::Error),
    TooManyPoints { requested: usize, max: usize },
    Plane(PlaneErr),
    Function(FunctionErr),
    Zeta(ZetaErr),
}

impl fmt::Display for RequestErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed(err) => write!(f, "malformed request: {err}"),
            Self::TooManyPoints { requested, max } => {
                write!(f, "{requested} points requested, at most {max} are allowed")
            }
            Self::Plane(err) => write!(f, "{err}"),
            Self::Function(err) => write!(f, "{err}"),
            Self::Zeta(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for RequestErr {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Malformed(err) => Some(err),
            Self::TooManyPoints { .. } => None,
            Self::Plane(err) => Some(err),
            Self::Function(err) => Some(err),
            Self::Zeta(err) => Some(err),
        }
    }
}

impl From<PlaneErr> for RequestErr {
    fn from(err: PlaneErr) -> Self {
        Self::Plane(err)
    }
}

impl From<FunctionErr> for RequestErr {
    fn from(err: FunctionErr) -> Self {
        Self::Function(err)
    }
}

impl From<ZetaErr> for RequestErr {
    fn from(err: ZetaErr) -> Self {
        Self::Zeta(err)
    }
}

impl From<&RequestErr> for ErrorResponse {
    fn from(err: &RequestErr) -> Self {
        Self {
            error: err.to_string(),
            status: BAD_REQUEST,
        }
    }
}

/// Built once, then shared by reference. Holds no mutable state.
#[derive(Clone, Debug)]
pub struct Engine<P = EulerMaclaurin, A = TreeAlgebra> {
    config: Config,
    plane: CoordinatePlane,
    zeta: ZetaEvaluator<P>,
    algebra: A,
}

impl Engine {
    pub fn new(config: Config) -> Result<Self, PlaneErr> {
        Self::with_parts(config, ZetaEvaluator::default(), TreeAlgebra::default())
    }
}

impl<P: ZetaPrimitive, A: Algebra> Engine<P, A> {
    pub fn with_parts(
        config: Config,
        zeta: ZetaEvaluator<P>,
        algebra: A,
    ) -> Result<Self, PlaneErr> {
        Ok(Self {
            config,
            plane: CoordinatePlane::new(config.delta)?,
            zeta,
            algebra,
        })
    }

    pub const fn config(&self) -> &Config {
        &self.config
    }

    pub const fn plane(&self) -> &CoordinatePlane {
        &self.plane
    }

    pub fn algebra(&self) -> &A {
        &self.algebra
    }

    pub fn handle(&self, req: &PlotRequest) -> Result<PlotResponse, RequestErr> {
        let max = self.config.max_points;
        if req.points > max {
            return Err(RequestErr::TooManyPoints {
                requested: req.points,
                max,
            });
        }

        let grid = self.plane.make_grid(req.tau_min, req.tau_max, req.points)?;
        let proj = project::project(&grid, req.plane, req.interest_radius, req.tau_max);

        let is_zeta = req.plot_type == PlotType::Zeta;
        let values = if is_zeta {
            self.zeta.evaluate_grid(&proj.eval_points)
        } else {
            Function::compile(&req.function)?.eval(&proj.eval_points)
        };
        let field = ValueField::new(values);

        let (critical_line, zeros) = if is_zeta {
            let line = zeta::critical_line(
                zeta::CRITICAL_T_MIN,
                req.t_max_crit,
                zeta::CRITICAL_LINE_POINTS,
            );
            let zeros = zeta::known_zeros(req.num_zeros)?;
            (
                Some(project::overlay(req.plane, &line)),
                Some(project::overlay(req.plane, &zeros)),
            )
        } else {
            (None, None)
        };

        let analysis = match req.plot_type {
            _ if !req.analyze => None,
            PlotType::Zeta => Some(analysis::zeta_report()),
            PlotType::GeneralFunc => Some(analysis::analyze(&self.algebra, &req.function)),
            PlotType::SimpleFunc => None,
        };

        let (rows, cols) = grid.shape();
        log::info!(
            "{} on {} over [{}, {}]: {rows}x{cols} grid",
            req.plot_type,
            req.plane,
            req.tau_min,
            req.tau_max
        );

        let (interest_mask, zone_mask) = match &proj.masks {
            Some(masks) => (
                Some(nested(&masks.interest.mapv(u8::from))),
                Some(nested(&masks.zone.mapv(u8::from))),
            ),
            None => (None, None),
        };
        let (w_x, w_y) = match &proj.w {
            Some((wx, wy)) => (Some(nested(wx)), Some(nested(wy))),
            None => (None, None),
        };

        Ok(PlotResponse {
            tau_x: grid.axis_x().to_vec(),
            tau_y: grid.axis_y().to_vec(),
            plot_type: req.plot_type,
            plane: req.plane,
            interest_radius: req.interest_radius,
            zone_radius: proj.zone_radius,
            interest_mask,
            zone_mask,
            w_x,
            w_y,
            function: (!is_zeta).then(|| req.function.clone()),
            critical_line,
            zeros,
            boundary_circle: self.plane.boundary_circle(),
            zone_circle: self.plane.zone_circle(req.epsilon),
            analysis,
            phase: nested(&field.phase()),
            magnitude: nested(&field.magnitude()),
            log_magnitude: nested(&field.log_magnitude()),
            real_part: nested(&field.real_part()),
            imag_part: nested(&field.imag_part()),
        })
    }

    /// Like `handle`, but every failure becomes an error response.
    pub fn respond(&self, req: &PlotRequest) -> Response {
        match self.handle(req) {
            Ok(resp) => Response::Plot(Box::new(resp)),
            Err(err) => {
                log::warn!("rejected request: {err}");
                Response::Error(ErrorResponse::from(&err))
            }
        }
    }

    /// Answers a JSON request body.
    pub fn respond_json(&self, body: &str) -> Response {
        match serde_json::from_str::<PlotRequest>(body) {
            Ok(req) => self.respond(&req),
            Err(err) => {
                let err = RequestErr::Malformed(err);
                log::warn!("rejected request: {err}");
                Response::Error(ErrorResponse::from(&err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> Engine {
        Engine::new(Config::default()).unwrap()
    }

    #[test]
    fn request_defaults() {
        let req: PlotRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req, PlotRequest::default());
        assert_eq!(req.plot_type, PlotType::SimpleFunc);
        assert_eq!(req.plane, PlaneKind::Tau);
        assert_eq!(req.function, "z*z");

        let req: PlotRequest = serde_json::from_str(
            r#"{"liminal_radius": 0.25, "plane": "w_plane", "plot_type": "zeta"}"#,
        )
        .unwrap();
        assert_eq!(req.interest_radius, 0.25);
        assert_eq!(req.plane, PlaneKind::W);
        assert_eq!(req.plot_type, PlotType::Zeta);
    }

    #[test]
    fn plot_type_names() {
        for t in PlotType::exhaustive() {
            assert_eq!(t.name().parse::<PlotType>(), Ok(*t));
            assert_eq!(serde_json::to_value(t).unwrap(), t.name());
        }
        assert!("surface".parse::<PlotType>().is_err());
    }

    #[test]
    fn simple_func_has_no_analysis() {
        let req = PlotRequest {
            points: 6,
            analyze: true,
            ..PlotRequest::default()
        };
        let resp = engine().handle(&req).unwrap();
        assert!(resp.analysis.is_none());
        assert_eq!(resp.function.as_deref(), Some("z*z"));
        assert!(resp.critical_line.is_none());
    }

    #[test]
    fn rejects_oversized_grids() {
        let req = PlotRequest {
            points: 401,
            ..PlotRequest::default()
        };
        let err = engine().handle(&req).unwrap_err();
        assert!(matches!(
            err,
            RequestErr::TooManyPoints {
                requested: 401,
                max: 400
            }
        ));
    }

    #[test]
    fn too_many_zeros_is_an_error() {
        let req = PlotRequest {
            plot_type: PlotType::Zeta,
            points: 4,
            num_zeros: 16,
            ..PlotRequest::default()
        };
        assert!(matches!(engine().handle(&req), Err(RequestErr::Zeta(_))));
    }

    #[test]
    fn malformed_json_is_an_error_response() {
        let resp = engine().respond_json("{\"points\": \"many\"}");
        let json = serde_json::to_value(&resp).unwrap();
        assert!(resp.is_error());
        assert_eq!(json["status"], 400);
        assert!(json["error"]
            .as_str()
            .unwrap()
            .starts_with("malformed request"));
    }
}
