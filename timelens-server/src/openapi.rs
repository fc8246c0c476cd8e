//! OpenAPI documentation configuration
//!
//! Generates OpenAPI 3.0 specification for the Timelens API.

use utoipa::OpenApi;

use crate::handlers::{
    AnalysisSummary, CatalogEntrySummary, ExifGpsInput, HealthResponse, MatchResponse,
    NearResponse, NearbyEntry, QueryLocation, ReadyResponse, ViewingArcSummary,
};
use crate::story::HistoricalStory;

/// Timelens API - OpenAPI Documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Timelens API",
        version = "0.1.0",
        description = r#"
## Street photo to historical photo matching

Upload a photo taken on the street and get back the historical photograph
taken from (nearly) the same spot, facing the same way.

### How It Works

1. Send the photo with whatever location signals you have via `POST /match`:
   device GPS, EXIF GPS, compass heading
2. Signals are fused into one position; image analysis (when configured) can
   place the photo even without GPS
3. Catalog photos within range are filtered by viewing direction and ranked
   by distance, shared landmarks and historical interest
4. The best photo comes back with a confidence score and a short story about
   its decade

Browse the catalog directly with `GET /catalog/near`.
"#,
        license(name = "MIT OR Apache-2.0")
    ),
    servers(
        (url = "http://localhost:3000", description = "Local development server")
    ),
    tags(
        (name = "Matching", description = "Match a street photo to a historical photograph"),
        (name = "Catalog", description = "Browse the historical photo catalog"),
        (name = "Health", description = "Service health and readiness endpoints")
    ),
    paths(
        crate::handlers::health::health,
        crate::handlers::health::ready,
        crate::handlers::matching::match_handler,
        crate::handlers::catalog::near_handler,
        crate::handlers::catalog::entry_handler,
    ),
    components(
        schemas(
            HealthResponse,
            ReadyResponse,
            MatchResponse,
            QueryLocation,
            AnalysisSummary,
            ExifGpsInput,
            HistoricalStory,
            CatalogEntrySummary,
            ViewingArcSummary,
            NearbyEntry,
            NearResponse,
        )
    )
)]
pub struct ApiDoc;
