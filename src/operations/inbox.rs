use super::{Args, Operation, Param, ParamKind, Plan, Registry, ResultShape};
use crate::{
    bridge::ScriptInvocation,
    error::{BridgeError, Result},
};

const LIST_INBOX_EMAILS_PARAMS: &[Param] = &[
    Param::optional("account", ParamKind::String, "Account name; all accounts when omitted"),
    Param::optional("max_emails", ParamKind::Integer, "Maximum emails per account (default: 0 = all)"),
    Param::optional("include_read", ParamKind::Boolean, "Include read emails (default: true)"),
    Param::optional("format", ParamKind::String, "\"text\" (default) or \"records\""),
];

const GET_RECENT_EMAILS_PARAMS: &[Param] = &[
    Param::required("account", ParamKind::String, "Account name"),
    Param::optional("count", ParamKind::Integer, "Number of emails to return (default: 10)"),
    Param::optional("include_content", ParamKind::Boolean, "Include a content preview (default: false)"),
];

pub fn register(registry: &mut Registry) {
    registry.register(Operation {
        name: "list_inbox_emails",
        category: "inbox",
        description: "List inbox emails across accounts, or for one account. \
            With format \"records\" the listing is returned as structured records.",
        params: LIST_INBOX_EMAILS_PARAMS,
        plan: plan_list_inbox,
    });
    registry.register(Operation {
        name: "get_recent_emails",
        category: "inbox",
        description: "Get the most recent emails in one account's inbox, newest first.",
        params: GET_RECENT_EMAILS_PARAMS,
        plan: plan_recent,
    });
    registry.register(Operation {
        name: "get_inbox_overview",
        category: "inbox",
        description: "Overview of every inbox: unread counts per account, mailbox \
            structure, the most recent emails and suggested next actions.",
        params: &[],
        plan: plan_overview,
    });
}

fn plan_list_inbox(args: &Args) -> Result<Plan> {
    let shape = match args.choice("format", &["text", "records"], Some("text"))?.as_str() {
        "records" => ResultShape::Records,
        _ => ResultShape::Text,
    };
    Ok(Plan {
        invocation: ScriptInvocation::file(
            "inbox/list_inbox_emails.applescript",
            vec![
                args.opt_str("account")?.into(),
                args.int_or("max_emails", 0)?.into(),
                args.bool_or("include_read", true)?.into(),
            ],
        ),
        shape,
    })
}

fn plan_recent(args: &Args) -> Result<Plan> {
    let count = args.int_or("count", 10)?;
    if count < 1 {
        return Err(BridgeError::InvalidArgument(format!(
            "'count' must be at least 1, got {count}"
        )));
    }
    Ok(Plan::text(ScriptInvocation::file(
        "inbox/get_recent_emails.applescript",
        vec![
            args.required_str("account")?.into(),
            count.into(),
            args.bool_or("include_content", false)?.into(),
        ],
    )))
}

fn plan_overview(_: &Args) -> Result<Plan> {
    Ok(Plan::text(ScriptInvocation::file(
        "inbox/get_inbox_overview.applescript",
        Vec::new(),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn format_selects_shape() {
        let text = plan_list_inbox(&Args::default()).unwrap();
        assert_eq!(text.shape, ResultShape::Text);

        let args = Args::from_value(json!({"format": "records", "max_emails": 5})).unwrap();
        assert_eq!(plan_list_inbox(&args).unwrap().shape, ResultShape::Records);

        let args = Args::from_value(json!({"format": "xml"})).unwrap();
        assert!(plan_list_inbox(&args).is_err());
    }

    #[test]
    fn recent_defaults_and_bounds() {
        let args = Args::from_value(json!({"account": "Gmail"})).unwrap();
        let ScriptInvocation::File { args: argv, .. } = plan_recent(&args).unwrap().invocation
        else {
            panic!("expected file invocation");
        };
        assert_eq!(crate::bridge::marshal::to_argv(&argv), ["Gmail", "10", "false"]);

        let args = Args::from_value(json!({"account": "Gmail", "count": 0})).unwrap();
        assert!(matches!(plan_recent(&args), Err(BridgeError::InvalidArgument(_))));
        assert!(plan_recent(&Args::default()).is_err());
    }
}
