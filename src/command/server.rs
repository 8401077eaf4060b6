use crate::area::{AreaApi, RestAreaApi};
use crate::conf::Conf;
use crate::screen::ScreenStore;
use crate::web;
use crate::Result;
use actix_web::dev::Service;
use actix_web::{
    middleware::{Compress, NormalizePath},
    web::Data,
    App, HttpServer,
};
use futures_util::future::FutureExt;
use std::sync::Arc;
use time::OffsetDateTime;
use tracing::info;

pub async fn run(conf: Conf) -> Result<()> {
    // All the worker threads are sharing the same screens and backend client
    let store = Data::new(ScreenStore::new(&conf));
    let api: Arc<dyn AreaApi> = Arc::new(RestAreaApi::new(&conf)?);
    let api = Data::from(api);
    info!(
        bind = conf.bind,
        port = conf.port,
        api_url = %conf.api_url,
        "Starting area editor",
    );

    HttpServer::new(move || {
        App::new()
            .wrap_fn(|req, srv| {
                let req_query_string = req.query_string().to_string();
                let req_method = req.method().as_str().to_string();
                let req_path = req.path().to_string();
                let req_time = OffsetDateTime::now_utc();
                let req_ip = req
                    .connection_info()
                    .peer_addr()
                    .unwrap_or_default()
                    .to_string();
                srv.call(req).map(move |res| {
                    if let Ok(res) = res.as_ref() {
                        let res_status = res.status().as_u16();
                        info!(
                            req_query_string,
                            req_method,
                            req_path,
                            req_ip,
                            res_status,
                            res_time_sec = (OffsetDateTime::now_utc() - req_time).as_seconds_f64(),
                        );
                    }
                    res
                })
            })
            .wrap(NormalizePath::trim())
            .wrap(Compress::default())
            .app_data(store.clone())
            .app_data(api.clone())
            .configure(web::configure)
    })
    .bind((conf.bind.as_str(), conf.port))?
    .run()
    .await?;

    Ok(())
}
