//! Resolves a parsed [`Command`] against the object tree and invokes the
//! matching verb (§2 "Control flow", §4.3). Shared by the TCP and HTTP
//! servers so a command behaves identically on either transport.

use mediad_core::{path, CoreError, CoreResult, NodeRef};
use serde_json::Value;

use crate::Command;

/// Resolves `command`'s path from `root` and invokes the corresponding
/// verb, returning the rendered JSON payload (`null` for `update`/`delete`,
/// which have no payload of their own per §4.3's verb table).
pub async fn execute(root: &NodeRef, command: Command) -> CoreResult<Value> {
    match command {
        Command::Create { path, name, description } => {
            let parent = path::resolve(root, &path).await?;
            let child = parent.create(&name, &description).await?;
            child.read().await
        },
        Command::Read { path } => {
            let node = path::resolve(root, &path).await?;
            node.read().await
        },
        Command::Update { path, value } => {
            let node = path::resolve(root, &path).await?;
            node.update(&value).await?;
            Ok(Value::Null)
        },
        Command::Delete { path, name } => {
            let parent = path::resolve(root, &path).await?;
            parent.delete(&name).await?;
            Ok(Value::Null)
        },
    }
}

/// Parses then executes a raw command line in one call, collapsing a parse
/// failure and a dispatch failure onto the same [`CoreError`] channel
/// (§4.5, §7: "Parser errors propagate unchanged").
pub async fn parse_and_execute(root: &NodeRef, input: Option<&str>) -> CoreResult<Value> {
    let command = crate::parse(input).map_err(CoreError::from)?;
    execute(root, command).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediad_core::Session;
    use mediad_engine::RefEngine;
    use std::sync::Arc;

    #[tokio::test]
    async fn create_play_read_delete_round_trip() {
        let session = Session::new(Arc::new(RefEngine::new()));
        let root = session.as_node_ref();

        let created = parse_and_execute(&root, Some("pipeline_create p0 fakesrc ! fakesink"))
            .await
            .unwrap();
        assert_eq!(created["name"], "p0");

        parse_and_execute(&root, Some("pipeline_play p0")).await.unwrap();
        let state = parse_and_execute(&root, Some("read /pipelines/p0/state")).await.unwrap();
        assert_eq!(state["value"], "playing");

        parse_and_execute(&root, Some("pipeline_stop p0")).await.unwrap();
        parse_and_execute(&root, Some("pipeline_delete p0")).await.unwrap();

        assert!(matches!(
            parse_and_execute(&root, Some("read /pipelines/p0")).await,
            Err(CoreError::NoResource(_))
        ));
    }

    #[tokio::test]
    async fn unknown_path_segment_is_no_resource() {
        let session = Session::new(Arc::new(RefEngine::new()));
        let root = session.as_node_ref();
        assert!(matches!(
            parse_and_execute(&root, Some("read /nope")).await,
            Err(CoreError::NoResource(_))
        ));
    }

    #[tokio::test]
    async fn empty_command_is_bad_command_not_a_panic() {
        let session = Session::new(Arc::new(RefEngine::new()));
        let root = session.as_node_ref();
        assert!(matches!(
            parse_and_execute(&root, Some("")).await,
            Err(CoreError::BadCommand(_))
        ));
    }
}
