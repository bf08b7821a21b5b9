use super::AuthenticatedUser;
use actix_web::HttpResponse;
use common::responses::CurrentUserResponse;

pub(crate) async fn process(user: AuthenticatedUser) -> HttpResponse {
    HttpResponse::Ok().json(CurrentUserResponse { user: user.0 })
}
