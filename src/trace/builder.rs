//! Trace construction from upstream, string-keyed data.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use super::{CustomerId, NameTable, RouteId, Trace};
use crate::error::{Error, Result};

/// Incremental builder for a [`Trace`].
///
/// Routes must be declared before [`build`](Self::build) resolves candidate
/// references, but declaration order between routes and candidates does not
/// matter. Dense ids follow declaration order.
#[derive(Debug, Clone, Default)]
pub struct TraceBuilder {
    routes: Vec<(String, Vec<String>)>,
    candidates: Vec<(String, Vec<(String, f64)>)>,
    baseline_score: f64,
}

impl TraceBuilder {
    /// Declares a route and the customers it consumes.
    pub fn route<I, S>(mut self, name: impl Into<String>, customers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.routes
            .push((name.into(), customers.into_iter().map(Into::into).collect()));
        self
    }

    /// Declares a candidate with its `(route, score)` options.
    pub fn candidate<I, S>(mut self, name: impl Into<String>, routes: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        self.candidates.push((
            name.into(),
            routes.into_iter().map(|(r, s)| (r.into(), s)).collect(),
        ));
        self
    }

    /// Sets the score of the upstream reference assignment.
    pub fn baseline_score(mut self, score: f64) -> Self {
        self.baseline_score = score;
        self
    }

    /// Validates and interns everything into an immutable [`Trace`].
    pub fn build(self) -> Result<Trace> {
        let mut routes = NameTable::default();
        let mut customers = NameTable::default();
        let mut customers_by_route = Vec::with_capacity(self.routes.len());

        for (name, route_customers) in &self.routes {
            let (_, fresh) = routes.intern(name);
            if !fresh {
                return Err(Error::DuplicateRoute(name.clone()));
            }
            let mut ids: Vec<CustomerId> = Vec::with_capacity(route_customers.len());
            for customer in route_customers {
                let id = CustomerId::new(customers.intern(customer).0);
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
            customers_by_route.push(ids);
        }

        let mut candidates = NameTable::default();
        let mut scores = Vec::with_capacity(self.candidates.len());
        let mut ranked_routes = Vec::with_capacity(self.candidates.len());
        let mut ranked_scores = Vec::with_capacity(self.candidates.len());

        for (name, options) in &self.candidates {
            let (_, fresh) = candidates.intern(name);
            if !fresh {
                return Err(Error::DuplicateCandidate(name.clone()));
            }

            let mut by_route = HashMap::with_capacity(options.len());
            let mut ranked = Vec::with_capacity(options.len());
            for (route, score) in options {
                let id = routes.get(route).map(RouteId::new).ok_or_else(|| {
                    Error::UnknownRoute {
                        candidate: name.clone(),
                        route: route.clone(),
                    }
                })?;
                if !score.is_finite() {
                    return Err(Error::InvalidScore {
                        candidate: name.clone(),
                        route: route.clone(),
                        score: *score,
                    });
                }
                if by_route.insert(id, *score).is_some() {
                    return Err(Error::DuplicateCandidateRoute {
                        candidate: name.clone(),
                        route: route.clone(),
                    });
                }
                ranked.push((id, *score));
            }

            // Stable sort: equal scores keep declaration order.
            ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
            ranked_scores.push(ranked.iter().map(|&(_, s)| s).collect());
            ranked_routes.push(ranked);
            scores.push(by_route);
        }

        Ok(Trace {
            candidates,
            routes,
            customers,
            scores,
            ranked_routes,
            ranked_scores,
            customers_by_route,
            baseline_score: self.baseline_score,
        })
    }
}

/// Trace-shaped data as an upstream collaborator hands it over.
///
/// Keys are sorted before interning, so the same data always yields the same
/// dense ids.
///
/// ```
/// use u_assign::trace::{Trace, TraceData};
///
/// let data: TraceData = toml::from_str(r#"
///     baseline_score = 150.0
///
///     [candidates.sam]
///     r1 = 100.0
///
///     [customers_by_route]
///     r1 = ["A"]
/// "#).unwrap();
///
/// let trace = Trace::try_from(data).unwrap();
/// assert_eq!(trace.baseline_score(), 150.0);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TraceData {
    /// `candidate -> route -> score`.
    pub candidates: BTreeMap<String, BTreeMap<String, f64>>,

    /// `route -> customers`.
    pub customers_by_route: BTreeMap<String, BTreeSet<String>>,

    /// Score of the reference assignment.
    #[serde(default)]
    pub baseline_score: f64,
}

impl TryFrom<TraceData> for Trace {
    type Error = Error;

    fn try_from(data: TraceData) -> Result<Self> {
        let mut builder = Trace::builder().baseline_score(data.baseline_score);
        for (route, customers) in data.customers_by_route {
            builder = builder.route(route, customers);
        }
        for (candidate, routes) in data.candidates {
            builder = builder.candidate(candidate, routes);
        }
        builder.build()
    }
}
