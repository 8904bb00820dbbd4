use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use vbc_blog_core::content::{
    filter_posts, paginate, ContentSelector, Pagination, RandomTagPicker, ALL_CATEGORIES, CATEGORIES,
};
use vbc_blog_core::document::DocumentId;
use vbc_blog_core::post::Post;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Public read routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/posts", get(list_posts))
        .route("/v1/posts/home", get(home))
        .route("/v1/posts/by-id/{id}", get(post_by_id))
        .route("/v1/posts/{slug}", get(post_by_slug))
        .route("/v1/categories", get(categories))
}

/// A post plus the display fields cards and bylines need.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PostView<'p> {
    #[serde(flatten)]
    post: &'p Post,
    formatted_date: String,
    author_name: &'p str,
    author_initial: char,
    read_time_label: &'p str,
}

impl<'p> From<&'p Post> for PostView<'p> {
    fn from(post: &'p Post) -> Self {
        Self {
            post,
            formatted_date: post.formatted_date(),
            author_name: post.author.display_name(),
            author_initial: post.author.initial(),
            read_time_label: post.read_time_or_default(),
        }
    }
}

fn views<'p>(posts: impl IntoIterator<Item = &'p Post>) -> Vec<PostView<'p>> {
    posts.into_iter().map(PostView::from).collect()
}

#[derive(Debug, Deserialize)]
struct ListParams {
    #[serde(default)]
    q: String,
    category: Option<String>,
    visible: Option<usize>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse<'p> {
    posts: Vec<PostView<'p>>,
    total: usize,
    visible_count: usize,
    has_more: bool,
}

/// `GET /v1/posts`: published posts, newest first, filtered and paged.
async fn list_posts(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Response> {
    let posts = state.posts().list_published().await?;
    let category = params.category.as_deref().unwrap_or(ALL_CATEGORIES);
    let filtered = filter_posts(&posts, &params.q, category);
    let pagination = Pagination::LISTING.with_visible(params.visible.unwrap_or(0));
    let page = paginate(&filtered, &pagination);

    Ok(Json(ListResponse {
        posts: views(page.posts),
        total: page.total,
        visible_count: page.visible_count,
        has_more: page.has_more,
    })
    .into_response())
}

#[derive(Debug, Deserialize)]
struct HomeParams {
    visible: Option<usize>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HomeResponse<'p> {
    featured: Option<PostView<'p>>,
    posts: Vec<PostView<'p>>,
    has_more: bool,
}

/// `GET /v1/posts/home`: the newest post featured, a grid of the rest.
async fn home(
    State(state): State<AppState>,
    Query(params): Query<HomeParams>,
) -> ApiResult<Response> {
    let posts = state.posts().list_published().await?;
    let (featured, rest) = match posts.split_first() {
        Some((first, rest)) => (Some(first), rest),
        None => (None, &posts[..]),
    };
    let pagination = Pagination::HOME_GRID.with_visible(params.visible.unwrap_or(0));

    Ok(Json(HomeResponse {
        featured: featured.map(PostView::from),
        posts: views(pagination.visible(rest)),
        has_more: pagination.has_more(rest.len()),
    })
    .into_response())
}

fn published(post: Option<Post>, what: &str) -> ApiResult<Post> {
    match post {
        Some(post) if post.is_published() => Ok(post),
        _ => Err(ApiError::NotFound(format!("post {what} not found"))),
    }
}

/// `GET /v1/posts/by-id/{id}`
async fn post_by_id(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Response> {
    let Ok(doc_id) = DocumentId::parse(&id) else {
        return Err(ApiError::NotFound(format!("post {id} not found")));
    };
    let post = published(state.posts().get(&doc_id).await?, &id)?;
    Ok(Json(PostView::from(&post)).into_response())
}

#[derive(Serialize)]
struct PostDetail<'p> {
    #[serde(flatten)]
    post: PostView<'p>,
    related: Vec<PostView<'p>>,
}

/// `GET /v1/posts/{slug}`: the article and its related posts. Related posts
/// are best effort; a failed lookup leaves the list empty.
async fn post_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Response> {
    let post = published(state.posts().find_by_slug(&slug).await?, &slug)?;
    let related = ContentSelector::new(state.posts())
        .select_or_empty(&post, &mut RandomTagPicker::from_entropy())
        .await;

    Ok(Json(PostDetail {
        post: PostView::from(&post),
        related: views(&related),
    })
    .into_response())
}

async fn categories() -> Json<[&'static str; 6]> {
    Json(CATEGORIES)
}
