/// 当前 UTC 毫秒时间戳
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
