//! OpenAPI documents of both services.

use utoipa::OpenApi;

use super::dto::{
    CategoryDto, CommentFullDto, CompilationDto, EndpointHitDto, EventFullDto,
    EventRequestStatusUpdateRequest, EventRequestStatusUpdateResult, EventShortDto, LocationDto,
    NewCategoryDto, NewCommentDto, NewCompilationDto, NewEventDto, NewUserRequest,
    ParticipationRequestDto, UpdateCommentDto, UpdateCompilationRequest, UpdateEventAdminRequest,
    UpdateEventUserRequest, UpdateStatusCommentAdmin, UserDto, UserShortDto, ViewStatsDto,
};
use super::handlers::{category, comment, compilation, event, request, stats, system, user};
use crate::error::ApiError;

/// OpenAPI document of the main service.
#[derive(Debug, OpenApi)]
#[openapi(
    info(title = "Explore With Me", description = "Event discovery: events, participation, comments and compilations"),
    paths(
        category::create_category,
        category::rename_category,
        category::delete_category,
        category::list_categories,
        category::get_category,
        user::create_user,
        user::list_users,
        user::delete_user,
        event::create_event,
        event::list_own_events,
        event::get_own_event,
        event::update_own_event,
        event::search_events_admin,
        event::update_event_admin,
        event::search_events_public,
        event::get_event_public,
        request::list_own_requests,
        request::create_request,
        request::cancel_request,
        request::list_event_requests,
        request::update_event_requests,
        comment::create_comment,
        comment::get_own_comment,
        comment::edit_own_comment,
        comment::list_own_comments,
        comment::list_event_comments,
        comment::moderate_comment,
        comment::delete_comment,
        comment::search_comments,
        compilation::create_compilation,
        compilation::update_compilation,
        compilation::delete_compilation,
        compilation::list_compilations,
        compilation::get_compilation,
        system::health_handler,
    ),
    components(schemas(
        ApiError,
        CategoryDto,
        NewCategoryDto,
        UserDto,
        UserShortDto,
        NewUserRequest,
        LocationDto,
        NewEventDto,
        UpdateEventUserRequest,
        UpdateEventAdminRequest,
        EventFullDto,
        EventShortDto,
        ParticipationRequestDto,
        EventRequestStatusUpdateRequest,
        EventRequestStatusUpdateResult,
        NewCommentDto,
        UpdateCommentDto,
        UpdateStatusCommentAdmin,
        CommentFullDto,
        NewCompilationDto,
        UpdateCompilationRequest,
        CompilationDto,
    )),
    tags(
        (name = "Categories", description = "Event categories"),
        (name = "Users", description = "User administration"),
        (name = "Events", description = "Event lifecycle and search"),
        (name = "Requests", description = "Participation requests"),
        (name = "Comments", description = "Comments and their moderation"),
        (name = "Compilations", description = "Curated event collections"),
        (name = "System", description = "Health"),
    )
)]
pub struct ApiDoc;

/// OpenAPI document of the statistics service.
#[derive(Debug, OpenApi)]
#[openapi(
    info(title = "Explore With Me statistics", description = "Endpoint hit ingestion and aggregation"),
    paths(stats::record_hit, stats::get_stats, system::health_handler),
    components(schemas(ApiError, EndpointHitDto, ViewStatsDto)),
    tags(
        (name = "Statistics", description = "Hits and aggregated views"),
        (name = "System", description = "Health"),
    )
)]
pub struct StatsApiDoc;
