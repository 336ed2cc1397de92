use crate::routes::health;
use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

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

/// API Documentation
///
/// Paths registered through the routers in [`crate::routes`] are added
/// when the routers are split.
#[derive(OpenApi)]
#[openapi(
    paths(health::health),
    modifiers(&SecurityAddon),
    tags(
        (name = "Tabs", description = "Course tab navigation and editing"),
        (name = "Program Enrollments", description = "Program and program course enrollments"),
        (name = "Programs", description = "Programs visible to the caller"),
        (name = "Admin", description = "Identity system callbacks and test environment tools"),
        (name = "Health", description = "Service health"),
    ),
    info(
        title = "Course Tabs and Program Enrollments API",
        version = "1.0.0",
        description = "Course tab management and bulk program enrollment",
        license(
            name = "MIT OR Apache-2.0",
        )
    )
)]
pub struct ApiDoc;
