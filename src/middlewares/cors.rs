use actix_cors::Cors;

pub fn create_cors() -> Cors {
    Cors::default()
        // 前端与移动端共用, 不限制来源
        .allowed_origin_fn(|_, _req_head| true)
        .allowed_methods(vec!["GET", "POST", "OPTIONS"])
        .allow_any_header()
        .max_age(3600)
}
