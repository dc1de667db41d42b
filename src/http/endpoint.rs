use rand::Rng;
use serde::Serialize;
use url::Url;

use crate::args::EndpointStrategy;
use crate::error::ValidationError;

/// Logical target route for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Route {
    Health,
    Order,
}

impl Route {
    #[must_use]
    pub(crate) const fn as_str(self) -> &'static str {
        match self {
            Route::Health => "health",
            Route::Order => "order",
        }
    }

    const fn path(self) -> &'static str {
        match self {
            Route::Health => "/health",
            Route::Order => "/order",
        }
    }
}

/// Route URLs resolved once at startup so a bad base URL fails before any
/// worker spawns.
#[derive(Debug, Clone)]
pub(crate) struct TargetUrls {
    pub(crate) health: Url,
    pub(crate) order: Url,
}

impl TargetUrls {
    pub(crate) fn from_base(base: &Url) -> Result<Self, ValidationError> {
        let join = |route: Route| {
            base.join(route.path())
                .map_err(|err| ValidationError::InvalidUrl {
                    url: base.as_str().to_owned(),
                    source: err,
                })
        };
        Ok(Self {
            health: join(Route::Health)?,
            order: join(Route::Order)?,
        })
    }

    pub(crate) const fn url_for(&self, route: Route) -> &Url {
        match route {
            Route::Health => &self.health,
            Route::Order => &self.order,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct OrderItem {
    pub(crate) id: String,
    pub(crate) quantity: u8,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct OrderPayload {
    pub(crate) items: Vec<OrderItem>,
    pub(crate) total: f64,
}

/// What the next request should look like: which route and, for orders,
/// which randomized payload.
#[derive(Debug, Clone)]
pub(crate) enum RequestPlan {
    Health,
    Order(OrderPayload),
}

impl RequestPlan {
    pub(crate) const fn route(&self) -> Route {
        match self {
            RequestPlan::Health => Route::Health,
            RequestPlan::Order(_) => Route::Order,
        }
    }
}

/// Pick the next request for the given strategy. The mixed strategy draws
/// independently per request (7 in 10 orders), with no ordering guarantee
/// across requests.
pub(crate) fn plan_request<R: Rng>(strategy: EndpointStrategy, rng: &mut R) -> RequestPlan {
    match strategy {
        EndpointStrategy::Health => RequestPlan::Health,
        EndpointStrategy::Order => RequestPlan::Order(random_order(rng)),
        EndpointStrategy::Mixed => {
            if rng.gen_ratio(7, 10) {
                RequestPlan::Order(random_order(rng))
            } else {
                RequestPlan::Health
            }
        }
    }
}

fn random_order<R: Rng>(rng: &mut R) -> OrderPayload {
    let item: u32 = rng.gen_range(1..=5);
    OrderPayload {
        items: vec![OrderItem {
            id: format!("item-{}", item),
            quantity: rng.gen_range(1..=5),
        }],
        total: rng.gen_range(100.0..1100.0),
    }
}
