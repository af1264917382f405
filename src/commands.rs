use crate::app::AdminApp;
use crate::auth::login_error_message;
use crate::client::{Resource, ResourceKind};
use crate::config::Command;
use crate::metrics::MetricName;
use crate::render::{format_key, render_records, render_value, NO_DATA};
use crate::screens::{find_user, save_identity_status, DashboardGraph, ListScreen, MetricsPanel};
use crate::types::{
  Country, Credentials, IdType, IdentityStatus, PackageType, Region, ResourceId, TransportType,
  User,
};
use serde_json::Value;

pub const NOT_SIGNED_IN: &str = "Not signed in";
pub const SIGNED_OUT: &str = "Signed out";

/// What a command printed and whether it succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
  pub success: bool,
  pub lines: Vec<String>,
}

impl CommandOutput {
  pub fn ok(lines: Vec<String>) -> Self {
    Self {
      success: true,
      lines,
    }
  }

  pub fn ok_line(line: impl Into<String>) -> Self {
    Self::ok(vec![line.into()])
  }

  pub fn failed(lines: Vec<String>) -> Self {
    Self {
      success: false,
      lines,
    }
  }

  pub fn failed_line(line: impl Into<String>) -> Self {
    Self::failed(vec![line.into()])
  }

  fn text(rendered: String) -> Self {
    Self::ok(rendered.lines().map(str::to_string).collect())
  }
}

/// Runs `$body` with `$r` bound to the record type of `$kind`.
macro_rules! with_resource {
  ($kind:expr, $r:ident => $body:expr) => {
    match $kind {
      ResourceKind::Country => {
        type $r = Country;
        $body
      }
      ResourceKind::Region => {
        type $r = Region;
        $body
      }
      ResourceKind::TransportType => {
        type $r = TransportType;
        $body
      }
      ResourceKind::PackageType => {
        type $r = PackageType;
        $body
      }
      ResourceKind::IdType => {
        type $r = IdType;
        $body
      }
      ResourceKind::User => {
        type $r = User;
        $body
      }
    }
  };
}

pub async fn execute(app: &AdminApp, command: Command) -> CommandOutput {
  match command {
    Command::Login { username, password } => login(app, username, password).await,
    Command::Logout => logout(app),
    Command::Whoami => whoami(app),
    Command::List {
      kind,
      page,
      country,
    } => match (kind.parse::<ResourceKind>(), country) {
      (Ok(ResourceKind::Region), Some(country)) => {
        let mut screen = ListScreen::<Region>::for_country(&ResourceId::new(country));
        screen.load(&app.client, page).await;
        list_output(&screen)
      }
      (Ok(_), Some(_)) => CommandOutput::failed_line("--country only applies to regions"),
      (Ok(kind), None) => with_resource!(kind, R => list::<R>(app, page).await),
      (Err(e), _) => CommandOutput::failed_line(e),
    },
    Command::Create { kind, json } => save(app, &kind, None, &json).await,
    Command::Update { kind, id, json } => save(app, &kind, Some(ResourceId::new(id)), &json).await,
    Command::Patch { kind, id, json } => patch(app, &kind, ResourceId::new(id), &json).await,
    Command::Delete { kind, id } => match kind.parse::<ResourceKind>() {
      Ok(kind) => with_resource!(kind, R => delete::<R>(app, ResourceId::new(id)).await),
      Err(e) => CommandOutput::failed_line(e),
    },
    Command::User { id } => match find_user(&app.client, &ResourceId::new(id)).await {
      Ok(user) => CommandOutput::text(render_records(&[user])),
      Err(lines) => CommandOutput::failed(lines),
    },
    Command::Identity { id, status } => identity(app, ResourceId::new(id), &status).await,
    Command::Metrics { reporting } => {
      let panel = if reporting {
        MetricsPanel::reporting(&app.metrics).await
      } else {
        MetricsPanel::summary(&app.metrics).await
      };
      metrics_output(&panel)
    }
    Command::Metric { name } => metric(app, &name).await,
    Command::Dashboard => dashboard(app).await,
  }
}

async fn login(app: &AdminApp, username: String, password: String) -> CommandOutput {
  let credentials = Credentials { username, password };
  let data = match app.session.login(&credentials).await {
    Ok(data) => data,
    Err(e) => {
      tracing::info!(kind = %e.kind, status = ?e.status, "login rejected");
      return CommandOutput::failed_line(login_error_message(&e));
    }
  };
  if let Err(e) = app.session.establish(&data) {
    tracing::error!(error = %e, "failed to persist session");
    return CommandOutput::failed_line(format!("Signed in, but the session could not be saved: {e}"));
  }
  let who = data
    .user
    .get("username")
    .and_then(Value::as_str)
    .unwrap_or(&credentials.username);
  CommandOutput::ok_line(format!("Signed in as {who}"))
}

fn logout(app: &AdminApp) -> CommandOutput {
  match app.session.logout() {
    Ok(()) => CommandOutput::ok_line(SIGNED_OUT),
    Err(e) => CommandOutput::failed_line(format!("Failed to clear session: {e}")),
  }
}

fn whoami(app: &AdminApp) -> CommandOutput {
  match app.session.profile() {
    Some(profile) if !profile.is_null() => CommandOutput::text(render_value(&profile)),
    _ => CommandOutput::failed_line(NOT_SIGNED_IN),
  }
}

fn list_output<R: Resource>(screen: &ListScreen<R>) -> CommandOutput {
  if let Some(lines) = &screen.error {
    return CommandOutput::failed(lines.clone());
  }
  let mut lines: Vec<String> = render_records(&screen.items)
    .lines()
    .map(str::to_string)
    .collect();
  lines.push(format!("Page {} of {}", screen.page, screen.total_pages));
  CommandOutput::ok(lines)
}

async fn list<R: Resource>(app: &AdminApp, page: u64) -> CommandOutput {
  let mut screen = ListScreen::<R>::new();
  screen.load(&app.client, page).await;
  list_output(&screen)
}

async fn save_typed<R: Resource>(app: &AdminApp, id: Option<ResourceId>, json: &str) -> CommandOutput {
  let input: R::Input = match serde_json::from_str(json) {
    Ok(input) => input,
    Err(e) => return CommandOutput::failed_line(format!("Invalid {} JSON: {e}", R::KIND.singular())),
  };
  let mut screen = ListScreen::<R>::new();
  match screen.save(&app.client, id.as_ref(), &input).await {
    Some(record) => CommandOutput::text(render_records(&[record])),
    None => CommandOutput::failed(screen.error.unwrap_or_default()),
  }
}

async fn save(app: &AdminApp, kind: &str, id: Option<ResourceId>, json: &str) -> CommandOutput {
  match kind.parse::<ResourceKind>() {
    Ok(ResourceKind::User) => {
      CommandOutput::failed_line("Users cannot be created or replaced; use `patch` or `identity`")
    }
    Ok(kind) => with_resource!(kind, R => save_typed::<R>(app, id, json).await),
    Err(e) => CommandOutput::failed_line(e),
  }
}

async fn patch_typed<R: Resource>(app: &AdminApp, id: ResourceId, partial: &Value) -> CommandOutput {
  match app.client.partial_update::<R>(&id, partial).await {
    Ok(record) => CommandOutput::text(render_records(&[record])),
    Err(e) => {
      CommandOutput::failed(e.screen_lines(&format!("Failed to save {}", R::KIND.singular())))
    }
  }
}

async fn patch(app: &AdminApp, kind: &str, id: ResourceId, json: &str) -> CommandOutput {
  let kind = match kind.parse::<ResourceKind>() {
    Ok(kind) => kind,
    Err(e) => return CommandOutput::failed_line(e),
  };
  let partial: Value = match serde_json::from_str(json) {
    Ok(value @ Value::Object(_)) => value,
    Ok(_) => return CommandOutput::failed_line("Patch body must be a JSON object"),
    Err(e) => return CommandOutput::failed_line(format!("Invalid JSON: {e}")),
  };
  with_resource!(kind, R => patch_typed::<R>(app, id, &partial).await)
}

async fn delete<R: Resource>(app: &AdminApp, id: ResourceId) -> CommandOutput {
  let mut screen = ListScreen::<R>::new();
  if screen.remove(&app.client, &id).await {
    CommandOutput::ok_line(format!("Deleted {} {id}", R::KIND.singular()))
  } else {
    CommandOutput::failed(screen.error.unwrap_or_default())
  }
}

async fn identity(app: &AdminApp, id: ResourceId, status: &str) -> CommandOutput {
  let status = match status.parse::<IdentityStatus>() {
    Ok(status) => status,
    Err(e) => return CommandOutput::failed_line(e),
  };
  match save_identity_status(&app.client, &id, status).await {
    Ok(_) => CommandOutput::ok_line(format!(
      "Identity status of user {id} set to {}",
      status.as_str()
    )),
    Err(lines) => CommandOutput::failed(lines),
  }
}

fn metric_block(name: MetricName, value: &Value) -> Vec<String> {
  let mut lines = vec![format!("== {} ==", format_key(name.as_str()))];
  lines.extend(render_value(value).lines().map(str::to_string));
  lines
}

fn metrics_output(panel: &MetricsPanel) -> CommandOutput {
  if let Some(lines) = &panel.error {
    return CommandOutput::failed(lines.clone());
  }
  let mut lines = Vec::new();
  for (i, (name, value)) in panel.values.iter().enumerate() {
    if i > 0 {
      lines.push(String::new());
    }
    lines.extend(metric_block(*name, value));
  }
  CommandOutput::ok(lines)
}

async fn dashboard(app: &AdminApp) -> CommandOutput {
  let graph = DashboardGraph::load(&app.metrics).await;
  if let Some(lines) = graph.error {
    return CommandOutput::failed(lines);
  }
  let mut lines = vec![format!("== {} ==", DashboardGraph::TITLE)];
  if graph.rows.is_empty() {
    lines.push(NO_DATA.to_string());
  } else {
    lines.extend(graph.render().lines().map(str::to_string));
  }
  CommandOutput::ok(lines)
}

async fn metric(app: &AdminApp, name: &str) -> CommandOutput {
  let name = match name.parse::<MetricName>() {
    Ok(name) => name,
    Err(e) => return CommandOutput::failed_line(e),
  };
  match app.metrics.fetch(name).await {
    Ok(value) => CommandOutput::ok(metric_block(name, &value)),
    Err(e) => {
      tracing::debug!(kind = %e.kind, status = ?e.status, metric = name.as_str(), "metric fetch failed");
      CommandOutput::failed_line(format!("Failed to load {}", format_key(name.as_str())))
    }
  }
}
