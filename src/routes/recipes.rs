use axum::{
    Router,
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use axum_extra::extract::WithRejection;

use crate::auth::RequireSession;
use crate::error::ApiError;
use crate::models::{PopularQuery, RateRecipe, RecipeForm, RecipeRows, SearchQuery, Session};
use crate::recipes::{RatingAggregate, RecipeView, write};
use crate::state::AppState;
use crate::store::RecipeFilter;

const DEFAULT_PER_PAGE: i64 = 12;
const MAX_PER_PAGE: i64 = 100;

pub fn recipes_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(search_recipes).post(create_recipe))
        .route("/popular", get(popular_recipes))
        .route(
            "/{recipe_id}",
            get(get_recipe).put(update_recipe).delete(delete_recipe),
        )
        .route("/{recipe_id}/rating", post(rate_recipe))
}

fn per_page(requested: Option<i64>) -> i64 {
    requested.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE)
}

async fn search_recipes(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = RecipeFilter {
        keyword: query.q,
        meal_type: query.meal_type,
        page: query.page.unwrap_or(0).max(0),
        per_page: per_page(query.per_page),
    };

    Ok(Json(state.recipes.search_recipes(&filter).await?))
}

async fn popular_recipes(
    State(state): State<AppState>,
    Query(query): Query<PopularQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = query.page.unwrap_or(1).max(1);
    let recipes = state
        .recipes
        .popular_recipes(page, per_page(query.per_page))
        .await?;

    Ok(Json(recipes))
}

async fn fetch_recipe(state: &AppState, recipe_id: &str) -> Result<RecipeRows, ApiError> {
    state
        .recipes
        .fetch_recipe(recipe_id)
        .await?
        .ok_or(ApiError::NotFound("Recipe"))
}

/// Recipes without an author can be changed by any signed-in user.
fn ensure_author(rows: &RecipeRows, session: &Session) -> Result<(), ApiError> {
    match rows.recipe.user_id.as_deref() {
        Some(author) if author != session.user_id && !session.is_admin => Err(ApiError::Forbidden),
        _ => Ok(()),
    }
}

async fn get_recipe(
    State(state): State<AppState>,
    Path(recipe_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = fetch_recipe(&state, &recipe_id).await?;
    Ok(Json(RecipeView::from(rows)))
}

async fn create_recipe(
    State(state): State<AppState>,
    RequireSession(session): RequireSession,
    WithRejection(Json(form), _): WithRejection<Json<RecipeForm>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let form = form.validate()?;
    let rows = write::create_recipe(state.recipes.as_ref(), &form, Some(&session.user_id)).await?;

    Ok((StatusCode::CREATED, Json(RecipeView::from(rows))))
}

async fn update_recipe(
    State(state): State<AppState>,
    RequireSession(session): RequireSession,
    Path(recipe_id): Path<String>,
    WithRejection(Json(form), _): WithRejection<Json<RecipeForm>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    ensure_author(&fetch_recipe(&state, &recipe_id).await?, &session)?;
    let form = form.validate()?;

    let rows = write::update_recipe(state.recipes.as_ref(), &recipe_id, &form)
        .await?
        .ok_or(ApiError::NotFound("Recipe"))?;

    Ok(Json(RecipeView::from(rows)))
}

async fn delete_recipe(
    State(state): State<AppState>,
    RequireSession(session): RequireSession,
    Path(recipe_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    ensure_author(&fetch_recipe(&state, &recipe_id).await?, &session)?;
    write::delete_recipe(state.recipes.as_ref(), &state.forests, &recipe_id).await?;

    Ok(Json(serde_json::json!({
        "message": "Recipe deleted successfully"
    })))
}

/// Read-modify-write of the aggregate; two clients rating at the same time
/// can overwrite each other's update.
async fn rate_recipe(
    State(state): State<AppState>,
    Path(recipe_id): Path<String>,
    WithRejection(Json(input), _): WithRejection<Json<RateRecipe>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = fetch_recipe(&state, &recipe_id).await?;

    let current = RatingAggregate::from_stored(rows.recipe.aggregate_rating, rows.recipe.rating_count);
    let next = current.apply(input.rating, input.previous_rating)?;
    state.recipes.update_rating(&recipe_id, next).await?;
    tracing::info!(%recipe_id, average = next.average, count = next.count, "recipe rated");

    Ok(Json(next))
}
