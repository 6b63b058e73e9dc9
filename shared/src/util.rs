/// Current UTC timestamp as an RFC 3339 string
///
/// Store rows carry ISO timestamps as strings (schema compatibility with
/// the hosted store), so snapshots do too.
pub fn now_iso() -> String {
    chrono::Utc::now().to_rfc3339()
}
