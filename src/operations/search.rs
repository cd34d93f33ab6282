//! Searching messages by subject, sender, status and date.

use super::{Args, Operation, Param, ParamKind, Plan, Registry};
use crate::{
    bridge::{ScriptArg, ScriptInvocation},
    error::{BridgeError, Result},
};

const READ_STATUSES: &[&str] = &["all", "read", "unread"];

/// Reply and forward markers dropped from a subject before thread matching.
const THREAD_PREFIXES: &[&str] = &["Re:", "RE:", "Fwd:", "FW:", "Fw:"];

/// Inline search with content preview. Every placeholder sits inside a
/// quoted literal, so values are escaped on render.
const CONTENT_SEARCH_TEMPLATE: &str = r#"
on lowercase(str)
    return do shell script "echo " & quoted form of str & " | tr '[:upper:]' '[:lower:]'"
end lowercase

tell application "Mail"
    set keyword to "{{subject_keyword}}"
    set mailboxName to "{{mailbox}}"
    set maxResults to "{{max_results}}" as integer
    set maxLength to "{{max_content_length}}" as integer
    set lowerKeyword to my lowercase(keyword)
    set outputText to "SEARCH RESULTS FOR: " & keyword & return
    set outputText to outputText & "Searching in: " & mailboxName & return & return
    set resultCount to 0
    try
        set targetAccount to account "{{account}}"
        if mailboxName is "All" then
            set searchMailboxes to every mailbox of targetAccount
        else
            try
                set searchMailboxes to {mailbox mailboxName of targetAccount}
            on error
                if mailboxName is "INBOX" then
                    set searchMailboxes to {mailbox "Inbox" of targetAccount}
                else
                    error "Mailbox not found: " & mailboxName
                end if
            end try
        end if
        repeat with currentMailbox in searchMailboxes
            repeat with aMessage in (every message of currentMailbox)
                if resultCount >= maxResults then exit repeat
                try
                    set messageSubject to subject of aMessage
                    if my lowercase(messageSubject) contains lowerKeyword then
                        if read status of aMessage then
                            set readIndicator to "✓"
                        else
                            set readIndicator to "✉"
                        end if
                        set outputText to outputText & readIndicator & " " & messageSubject & return
                        set outputText to outputText & "   From: " & (sender of aMessage) & return
                        set outputText to outputText & "   Date: " & ((date received of aMessage) as string) & return
                        set outputText to outputText & "   Mailbox: " & (name of currentMailbox) & return
                        try
                            set AppleScript's text item delimiters to {return, linefeed}
                            set contentParts to text items of (content of aMessage)
                            set AppleScript's text item delimiters to " "
                            set cleanText to contentParts as string
                            set AppleScript's text item delimiters to ""
                            if maxLength > 0 and length of cleanText > maxLength then
                                set cleanText to (text 1 thru maxLength of cleanText) & "..."
                            end if
                            set outputText to outputText & "   Content: " & cleanText & return
                        on error
                            set outputText to outputText & "   Content: [Not available]" & return
                        end try
                        set outputText to outputText & return
                        set resultCount to resultCount + 1
                    end if
                end try
            end repeat
        end repeat
        set outputText to outputText & "========================================" & return
        set outputText to outputText & "FOUND: " & resultCount & " matching email(s)" & return
        set outputText to outputText & "========================================" & return
    on error errMsg
        return "Error: " & errMsg
    end try
    return outputText
end tell
"#;

const SEARCH_EMAILS_PARAMS: &[Param] = &[
    Param::required("account", ParamKind::String, "Account name"),
    Param::optional("mailbox", ParamKind::String, "Mailbox to search (default: INBOX, \"All\" for every mailbox)"),
    Param::optional("subject_keyword", ParamKind::String, "Keyword to match in subjects"),
    Param::optional("sender", ParamKind::String, "Sender address or name to match"),
    Param::optional("has_attachments", ParamKind::Boolean, "Require (true) or exclude (false) attachments"),
    Param::optional("read_status", ParamKind::String, "\"all\" (default), \"read\" or \"unread\""),
    Param::optional("date_from", ParamKind::String, "Earliest date received, YYYY-MM-DD"),
    Param::optional("date_to", ParamKind::String, "Latest date received, YYYY-MM-DD"),
    Param::optional("include_content", ParamKind::Boolean, "Include a content preview (slower, default: false)"),
    Param::optional("max_results", ParamKind::Integer, "Maximum results (default: 20)"),
];

const GET_EMAIL_WITH_CONTENT_PARAMS: &[Param] = &[
    Param::required("account", ParamKind::String, "Account name"),
    Param::required("subject_keyword", ParamKind::String, "Keyword to match in subjects"),
    Param::optional("max_results", ParamKind::Integer, "Maximum results (default: 5)"),
    Param::optional("max_content_length", ParamKind::Integer, "Preview length in characters (default: 300, 0 = unlimited)"),
    Param::optional("mailbox", ParamKind::String, "Mailbox to search (default: INBOX, \"All\" for every mailbox)"),
];

const GET_EMAIL_THREAD_PARAMS: &[Param] = &[
    Param::required("account", ParamKind::String, "Account name"),
    Param::required("subject_keyword", ParamKind::String, "Subject of any message in the thread"),
    Param::optional("mailbox", ParamKind::String, "Mailbox to search (default: INBOX, \"All\" for every mailbox)"),
    Param::optional("max_messages", ParamKind::Integer, "Maximum messages in the thread (default: 50)"),
];

pub fn register(registry: &mut Registry) {
    registry.register(Operation {
        name: "search_emails",
        category: "search",
        description: "Search emails with filters on subject, sender, attachments, read \
            status and date range, in one mailbox or all of them (mailbox \"All\").",
        params: SEARCH_EMAILS_PARAMS,
        plan: plan_search,
    });
    registry.register(Operation {
        name: "get_email_with_content",
        category: "search",
        description: "Find emails by subject keyword (case-insensitive) and return them \
            with a content preview.",
        params: GET_EMAIL_WITH_CONTENT_PARAMS,
        plan: plan_content_search,
    });
    registry.register(Operation {
        name: "get_email_thread",
        category: "search",
        description: "Show a conversation thread: every message whose subject matches \
            the topic once Re:/Fwd: prefixes are removed.",
        params: GET_EMAIL_THREAD_PARAMS,
        plan: plan_thread,
    });
}

fn plan_search(args: &Args) -> Result<Plan> {
    Ok(Plan::text(ScriptInvocation::file(
        "search/search_emails.applescript",
        vec![
            args.required_str("account")?.into(),
            args.str_or("mailbox", "INBOX")?.into(),
            args.opt_str("subject_keyword")?.into(),
            args.opt_str("sender")?.into(),
            args.opt_bool("has_attachments")?.into(),
            args.choice("read_status", READ_STATUSES, Some("all"))?.into(),
            args.opt_str("date_from")?.into(),
            args.opt_str("date_to")?.into(),
            args.bool_or("include_content", false)?.into(),
            args.int_or("max_results", 20)?.into(),
        ],
    )))
}

fn plan_content_search(args: &Args) -> Result<Plan> {
    let bindings: [(&str, ScriptArg); 5] = [
        ("account", args.required_str("account")?.into()),
        ("subject_keyword", args.required_str("subject_keyword")?.into()),
        ("max_results", args.int_or("max_results", 5)?.into()),
        ("max_content_length", args.int_or("max_content_length", 300)?.into()),
        ("mailbox", args.str_or("mailbox", "INBOX")?.into()),
    ];
    Ok(Plan::text(ScriptInvocation::inline_template(
        CONTENT_SEARCH_TEMPLATE,
        &bindings,
    )))
}

fn plan_thread(args: &Args) -> Result<Plan> {
    let subject = args.required_str("subject_keyword")?;
    let topic = thread_topic(&subject);
    if topic.is_empty() {
        return Err(BridgeError::InvalidArgument(format!(
            "'subject_keyword' has no topic once prefixes are removed: {subject:?}"
        )));
    }
    Ok(Plan::text(ScriptInvocation::file(
        "search/get_email_thread.applescript",
        vec![
            args.required_str("account")?.into(),
            topic.into(),
            args.str_or("mailbox", "INBOX")?.into(),
            args.int_or("max_messages", 50)?.into(),
        ],
    )))
}

/// Subject with leading reply/forward markers removed, repeatedly.
fn thread_topic(subject: &str) -> String {
    let mut topic = subject.trim();
    while let Some(rest) = THREAD_PREFIXES.iter().find_map(|p| topic.strip_prefix(p)) {
        topic = rest.trim_start();
    }
    topic.trim_end().to_string()
}
