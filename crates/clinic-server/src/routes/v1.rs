//! API v1 routes.

use crate::{
    error::{ApiError, ApiResult},
    middleware::{Auth, AuthUser, AuthzLayer, MaybeAuth},
    response::ApiResponse,
    state::AppState,
};
use axum::{
    extract::{Query, State},
    routing::{get, on, post, MethodFilter},
    Json, Router,
};
use clinic_authz::{
    standard_menu, visible_menu, MenuItem, NavigationOutcome, Permission as P, Role, RolePolicy,
    Session,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

/// A clinic resource endpoint and the permissions that unlock it.
struct Endpoint {
    method: MethodFilter,
    path: &'static str,
    resource: &'static str,
    action: &'static str,
    requires: &'static [P],
}

macro_rules! endpoint {
    ($method:ident $path:literal => $resource:literal . $action:literal [$($perm:ident),*]) => {
        Endpoint {
            method: MethodFilter::$method,
            path: $path,
            resource: $resource,
            action: $action,
            requires: &[$(P::$perm),*],
        }
    };
}

/// Resource endpoints. An empty permission list makes the endpoint public.
static ENDPOINTS: &[Endpoint] = &[
    endpoint!(GET "/patients" => "patients"."list" [PatientsRead]),
    endpoint!(POST "/patients" => "patients"."create" [PatientsWrite]),
    endpoint!(GET "/patients/:id" => "patients"."show" [PatientsRead]),
    endpoint!(PUT "/patients/:id" => "patients"."update" [PatientsWrite]),
    endpoint!(DELETE "/patients/:id" => "patients"."delete" [PatientsDelete]),
    endpoint!(GET "/medical-records" => "medical_records"."list" [MedicalRecordsRead]),
    endpoint!(POST "/medical-records" => "medical_records"."create" [MedicalRecordsWrite]),
    endpoint!(GET "/prescriptions" => "prescriptions"."list" [PrescriptionsRead]),
    endpoint!(POST "/prescriptions" => "prescriptions"."create" [PrescriptionsWrite]),
    endpoint!(POST "/prescriptions/:id/sign" => "prescriptions"."sign" [PrescriptionsSign]),
    endpoint!(GET "/pharmacy/inventory" => "pharmacy"."list" [PharmacyRead, PharmacyManage]),
    endpoint!(PUT "/pharmacy/inventory/:id" => "pharmacy"."update" [PharmacyManage]),
    endpoint!(POST "/pharmacy/dispense" => "pharmacy"."dispense" [PharmacyDispense]),
    endpoint!(GET "/appointments" => "appointments"."list" [AppointmentsRead, AppointmentsManage]),
    endpoint!(POST "/appointments" => "appointments"."create" [AppointmentsManage]),
    endpoint!(GET "/billing/invoices" => "billing"."list" [BillingRead, BillingManage]),
    endpoint!(POST "/billing/invoices" => "billing"."create" [BillingManage]),
    endpoint!(GET "/assets" => "assets"."list" [AssetsRead, AssetsManage]),
    endpoint!(POST "/assets" => "assets"."create" [AssetsManage]),
    endpoint!(GET "/reports" => "reports"."list" [ReportsView]),
    endpoint!(GET "/reports/export" => "reports"."export" [ReportsExport]),
    endpoint!(GET "/users" => "users"."list" [UsersRead, UsersManage]),
    endpoint!(PUT "/users/:id/roles" => "users"."assign_roles" [UsersManage]),
    endpoint!(GET "/clinics" => "clinics"."list" []),
    endpoint!(POST "/clinics" => "clinics"."create" [ClinicsManage]),
    endpoint!(GET "/settings" => "settings"."show" [SettingsManage]),
    endpoint!(PUT "/settings" => "settings"."update" [SettingsManage]),
];

/// Create the v1 API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(resource_routes())
        .route("/auth/me", get(auth_me))
        .route("/navigation/check", get(navigation_check))
        .route("/navigation/menu", get(navigation_menu))
        .route(
            "/policy",
            get(policy_overview)
                .route_layer(AuthzLayer::any_of([P::UsersManage, P::SettingsManage])),
        )
        .route(
            "/admin/maintenance",
            post(maintenance).route_layer(AuthzLayer::allowed_roles([Role::SuperAdmin])),
        )
}

fn resource_routes() -> Router<AppState> {
    ENDPOINTS.iter().fold(Router::new(), |router, endpoint| {
        router.route(
            endpoint.path,
            on(endpoint.method, move |MaybeAuth(user): MaybeAuth| acknowledge(endpoint, user))
                .route_layer(AuthzLayer::any_of(endpoint.requires.iter().copied())),
        )
    })
}

#[derive(Serialize)]
struct Acknowledgement {
    resource: &'static str,
    action: &'static str,
    requested_by: Option<Uuid>,
    items: Vec<Value>,
}

// Resource storage lives behind these routes in other services; this server
// only decides who may reach them.
async fn acknowledge(
    endpoint: &'static Endpoint,
    user: Option<AuthUser>,
) -> Json<ApiResponse<Acknowledgement>> {
    Json(ApiResponse::success(Acknowledgement {
        resource: endpoint.resource,
        action: endpoint.action,
        requested_by: user.map(|u| u.id),
        items: Vec::new(),
    }))
}

#[derive(Serialize)]
struct CurrentUser {
    id: Uuid,
    email: String,
    clinic_id: Option<Uuid>,
    roles: Vec<&'static str>,
    unrecognized_roles: Vec<String>,
    permissions: Vec<&'static str>,
    menu: Vec<MenuItem>,
}

async fn auth_me(Auth(user): Auth) -> Json<ApiResponse<CurrentUser>> {
    let principal = &user.principal;

    Json(ApiResponse::success(CurrentUser {
        id: user.id,
        email: user.email.clone(),
        clinic_id: user.clinic_id,
        roles: principal.roles().iter().map(|r| r.as_str()).collect(),
        unrecognized_roles: principal.unrecognized().to_vec(),
        permissions: principal.permissions().iter().map(|p| p.as_str()).collect(),
        menu: visible_menu(&standard_menu(), Some(principal)),
    }))
}

#[derive(Debug, Deserialize)]
struct NavigationQuery {
    path: Option<String>,
}

async fn navigation_check(
    State(state): State<AppState>,
    MaybeAuth(user): MaybeAuth,
    Query(query): Query<NavigationQuery>,
) -> ApiResult<Json<ApiResponse<NavigationOutcome>>> {
    let path = query
        .path
        .filter(|p| p.starts_with('/'))
        .ok_or_else(|| ApiError::InvalidQueryParam("path must be an absolute path".into()))?;

    let session = Session::from(user.map(|u| u.principal));
    let outcome = state.navigation.check_path(&state.routes, &path, &session);

    Ok(Json(ApiResponse::success(outcome)))
}

async fn navigation_menu(MaybeAuth(user): MaybeAuth) -> Json<ApiResponse<Vec<MenuItem>>> {
    let principal = user.map(|u| u.principal);
    Json(ApiResponse::success(visible_menu(&standard_menu(), principal.as_ref())))
}

async fn policy_overview() -> Json<ApiResponse<Value>> {
    let policy = RolePolicy::standard();
    let roles: serde_json::Map<String, Value> = Role::ALL
        .iter()
        .map(|role| {
            let granted: Vec<&str> = policy
                .permissions_for_role(*role)
                .iter()
                .map(|p| p.as_str())
                .collect();
            (role.as_str().to_string(), json!(granted))
        })
        .collect();

    Json(ApiResponse::success(json!({
        "permissions": P::ALL.iter().map(|p| p.as_str()).collect::<Vec<_>>(),
        "roles": roles,
    })))
}

async fn maintenance(Auth(user): Auth) -> Json<ApiResponse<Value>> {
    tracing::info!(user_id = %user.id, "Maintenance requested");
    Json(ApiResponse::success(json!({ "maintenance": "scheduled" })))
}
