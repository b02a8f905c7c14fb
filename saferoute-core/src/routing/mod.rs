//! Online routing: minimum-risk search and the request pipeline around it

mod planner;
mod router;
mod state;

pub use planner::{
    RiskHeuristic, Route, SearchLimits, ZeroHeuristic, plan_route, plan_route_with_heuristic,
};
pub use router::{RouteQuery, Router, parse_coordinate};
