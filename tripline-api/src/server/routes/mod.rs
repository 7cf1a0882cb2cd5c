use crate::server::ServerRouter;

mod account;
mod journeys;
mod likes;
mod session;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .merge(session::routes())
        .merge(journeys::routes())
        .merge(likes::routes())
        .merge(account::routes())
}
