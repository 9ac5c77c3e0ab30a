use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::handlers;

#[derive(OpenApi)]
#[openapi(
    info(title = "Portfolio Backend API"),
    paths(
        handlers::auth::login,
        handlers::auth::me,
        handlers::contact::create_contact,
        handlers::contact::list_contacts,
        handlers::contact::get_contact,
        handlers::contact::update_contact,
        handlers::contact::delete_contact,
        handlers::stats::summary,
        handlers::stats::subjects,
        handlers::stats::budgets,
        handlers::stats::timeline,
        handlers::health::health,
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "jwt",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/auth/login",
            "/api/auth/me",
            "/api/contact",
            "/api/contact/{id}",
            "/api/stats",
            "/api/stats/subjects",
            "/api/stats/budgets",
            "/api/stats/timeline",
            "/api/health",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("jwt"));
    }
}
