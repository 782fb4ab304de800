use askama::Template;
use askama_web::WebTemplate;

#[derive(Template, WebTemplate)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {}

#[derive(Template, WebTemplate)]
#[template(path = "drone.html")]
pub struct DroneTemplate {
    pub drone_id: String,
}
