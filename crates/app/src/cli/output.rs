//! Plain-text rendering shared by the subcommands.

use std::{error::Error, fmt::Display};

use custody_app::domain::{
    audit::records::AuditEntryRecord,
    requests::records::{RequestItemRecord, RequestRecord},
    tokens::records::TokenRecord,
    waitlist::records::WaitlistEntry,
};

/// `context: error: source: source...`
pub(crate) fn failure(context: &str, error: &(dyn Error + 'static)) -> String {
    let mut message = format!("{context}: {error}");
    let mut source = error.source();

    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }

    message
}

fn or_dash<T: Display>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |value| value.to_string())
}

pub(crate) fn print_request(request: &RequestRecord) {
    println!("request_id: {}", request.id);
    println!("status: {}", request.status);
    println!("requester_id: {}", request.requester_id);
    println!(
        "requester_name: {}",
        or_dash(request.requester_display_name.as_deref())
    );
    println!("purpose: {}", request.purpose);
    println!("comment: {}", or_dash(request.comment.as_deref()));
    println!("requested_at: {}", request.requested_at);
    println!("approved_by: {}", or_dash(request.approved_by));
    println!("approved_at: {}", or_dash(request.approved_at));
    println!("issued_by: {}", or_dash(request.issued_by));
    println!("issued_at: {}", or_dash(request.issued_at));
    println!("returned_by: {}", or_dash(request.returned_by));
    println!("returned_at: {}", or_dash(request.returned_at));
}

pub(crate) fn print_request_line(request: &RequestRecord) {
    println!(
        "{}\t{}\t{}\t{}\t{}",
        request.id,
        request.status,
        request.requester_id,
        request.requested_at,
        request.purpose
    );
}

pub(crate) fn print_items(items: &[RequestItemRecord]) {
    for item in items {
        println!("item: {} ({})", item.token_id, item.company);
    }
}

pub(crate) fn print_token(token: &TokenRecord) {
    println!("{}\t{}\t{}", token.token_id, token.status, token.description);
}

pub(crate) fn print_audit_entry(entry: &AuditEntryRecord) {
    println!(
        "{}\t{}\t{}\trequest={}\tactor={}\t{}",
        entry.id,
        entry.ts,
        entry.action,
        or_dash(entry.request_id),
        entry.actor_id,
        entry.payload
    );
}

pub(crate) fn print_waitlist_entry(entry: &WaitlistEntry) {
    println!(
        "{}\t{}\t{}\t{}",
        entry.requester_id, entry.token_id, entry.company, entry.created_at
    );
}
