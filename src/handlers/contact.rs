use axum::{
    extract::{ConnectInfo, Extension, Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use std::net::SocketAddr;
use std::sync::Arc;
use crate::AppState;
use crate::error::AppResult;
use crate::handlers::{ApiJson, ApiQuery};
use crate::models::contact::{
    ContactListQuery, ContactListResponse, ContactPatch, ContactRequest, CreateContactRequest,
    CreateContactResponse, DeleteContactResponse, RequestMetadata, UpdateContactResponse,
};
use crate::models::user::Capability;
use crate::services::auth::Claims;
use crate::services::contact::{self, ListFilter};
use crate::utils::{client_ip, user_agent};

#[utoipa::path(
    post,
    path = "/api/contact",
    tag = "contact",
    request_body = CreateContactRequest,
    responses(
        (status = 201, description = "Submission stored", body = CreateContactResponse),
        (status = 400, description = "Validation failed")
    )
)]
pub async fn create_contact(
    State(state): State<Arc<AppState>>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    ApiJson(payload): ApiJson<CreateContactRequest>,
) -> AppResult<(StatusCode, Json<CreateContactResponse>)> {
    let meta = RequestMetadata {
        ip_address: client_ip(
            &headers,
            connect_info.map(|ConnectInfo(addr)| addr),
            state.config.trust_proxy,
        ),
        user_agent: user_agent(&headers),
    };

    let id = contact::create(&state.db, payload, meta).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateContactResponse {
            success: true,
            message: "Your message has been sent. I'll get back to you soon.".into(),
            id,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/contact",
    tag = "contact",
    params(ContactListQuery),
    responses(
        (status = 200, description = "Paginated submissions", body = ContactListResponse),
        (status = 400, description = "Unknown status filter"),
        (status = 401, description = "Missing or invalid token")
    ),
    security(
        ("jwt" = [])
    )
)]
pub async fn list_contacts(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    ApiQuery(query): ApiQuery<ContactListQuery>,
) -> AppResult<Json<ContactListResponse>> {
    claims.require_capability(Capability::ViewSubmissions)?;
    let filter = ListFilter::from_query(query)?;
    Ok(Json(contact::list(&state.db, &filter).await?))
}

#[utoipa::path(
    get,
    path = "/api/contact/{id}",
    tag = "contact",
    params(("id" = String, Path, description = "Submission id")),
    responses(
        (status = 200, description = "Submission", body = ContactRequest),
        (status = 404, description = "Not found")
    ),
    security(
        ("jwt" = [])
    )
)]
pub async fn get_contact(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> AppResult<Json<ContactRequest>> {
    claims.require_capability(Capability::ViewSubmissions)?;
    Ok(Json(contact::get_by_id(&state.db, &id).await?))
}

#[utoipa::path(
    patch,
    path = "/api/contact/{id}",
    tag = "contact",
    params(("id" = String, Path, description = "Submission id")),
    request_body = ContactPatch,
    responses(
        (status = 200, description = "Updated", body = UpdateContactResponse),
        (status = 400, description = "Empty or invalid patch"),
        (status = 404, description = "Not found")
    ),
    security(
        ("jwt" = [])
    )
)]
pub async fn update_contact(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<ContactPatch>,
) -> AppResult<Json<UpdateContactResponse>> {
    claims.require_capability(Capability::ManageSubmissions)?;
    let updated = contact::update(&state.db, &id, &patch, &claims.sub).await?;

    Ok(Json(UpdateContactResponse {
        success: true,
        message: "Request updated".into(),
        data: updated,
    }))
}

#[utoipa::path(
    delete,
    path = "/api/contact/{id}",
    tag = "contact",
    params(("id" = String, Path, description = "Submission id")),
    responses(
        (status = 200, description = "Deleted", body = DeleteContactResponse),
        (status = 404, description = "Not found")
    ),
    security(
        ("jwt" = [])
    )
)]
pub async fn delete_contact(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> AppResult<Json<DeleteContactResponse>> {
    claims.require_capability(Capability::ManageSubmissions)?;
    contact::delete(&state.db, &id, &claims.sub).await?;

    Ok(Json(DeleteContactResponse {
        success: true,
        message: "Request deleted".into(),
    }))
}
