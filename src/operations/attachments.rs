use super::{Args, Operation, Param, ParamKind, Plan, Registry};
use crate::{bridge::ScriptInvocation, error::Result};

const LIST_EMAIL_ATTACHMENTS_PARAMS: &[Param] = &[
    Param::required("account", ParamKind::String, "Account name"),
    Param::required("subject_keyword", ParamKind::String, "Keyword to match in subjects"),
    Param::optional("max_results", ParamKind::Integer, "Maximum matching emails (default: 1)"),
];

const SAVE_EMAIL_ATTACHMENT_PARAMS: &[Param] = &[
    Param::required("account", ParamKind::String, "Account name"),
    Param::required("subject_keyword", ParamKind::String, "Keyword to match in subjects"),
    Param::required("attachment_name", ParamKind::String, "Name (or part of it) of the attachment"),
    Param::required("save_path", ParamKind::String, "Where to write the file; ~ expands to home"),
];

pub fn register(registry: &mut Registry) {
    registry.register(Operation {
        name: "list_email_attachments",
        category: "attachments",
        description: "List the attachments, with sizes, of inbox emails matching a subject keyword.",
        params: LIST_EMAIL_ATTACHMENTS_PARAMS,
        plan: plan_list,
    });
    registry.register(Operation {
        name: "save_email_attachment",
        category: "attachments",
        description: "Save one attachment of the first matching inbox email to disk.",
        params: SAVE_EMAIL_ATTACHMENT_PARAMS,
        plan: plan_save,
    });
}

fn plan_list(args: &Args) -> Result<Plan> {
    Ok(Plan::text(ScriptInvocation::file(
        "attachments/list_email_attachments.applescript",
        vec![
            args.required_str("account")?.into(),
            args.required_str("subject_keyword")?.into(),
            args.int_or("max_results", 1)?.into(),
        ],
    )))
}

fn plan_save(args: &Args) -> Result<Plan> {
    Ok(Plan::text(ScriptInvocation::file(
        "attachments/save_email_attachment.applescript",
        vec![
            args.required_str("account")?.into(),
            args.required_str("subject_keyword")?.into(),
            args.required_str("attachment_name")?.into(),
            args.required_path("save_path")?.into(),
        ],
    )))
}
