use axum::Json;
use tracing::instrument;

use crate::error::ErrorBody;
use crate::extractors::auth::AuthUser;
use crate::models::admin::{AdminSchemaResponse, admin_schema};

#[utoipa::path(
    get,
    path = "/schema",
    tag = "Admin",
    operation_id = "getAdminSchema",
    summary = "Describe the catalog models",
    description = "Returns every catalog model with its fields, verbose names, limits and upload directories. Fields marked `read_only` (`num_views`, `num_likes`, `published_at` on videos) are displayed but never accepted by create or update.",
    responses(
        (status = 200, description = "Admin schema", body = AdminSchemaResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(auth_user), fields(user_id = auth_user.user_id))]
pub async fn get_schema(auth_user: AuthUser) -> Json<AdminSchemaResponse> {
    Json(admin_schema())
}
