use leptos::prelude::*;
use leptos::task::spawn_local;
use log::{error, info, warn};

mod refresh;

use refresh::RefreshGuard;

use crate::api::ApiClient;
use crate::components::relation_graph::RelationGraphCanvas;
use crate::config::Config;
use crate::error::Result;
use crate::graph::{self, DagreLayout, Graph};
use crate::records::{Object, Snapshot};

/// Objects plus the schema snapshot they are built against.
async fn load(client: &ApiClient, page_size: u32) -> Result<(Vec<Object>, Snapshot)> {
	let objects = client.fetch_objects(page_size).await?;
	let snapshot = client.fetch_snapshot().await?;
	Ok((objects, snapshot))
}

/// Relationship graph of every object, object type and funnel step.
#[component]
pub fn DataPage() -> impl IntoView {
	let config = use_context::<Config>().unwrap_or_default();
	let client = ApiClient::new(&config.api_base_url);
	let (page_size, node_size) = (config.page_size, config.node_size);

	let graph_data = RwSignal::new(Graph::default());
	let loading = RwSignal::new(true);
	let direction = RwSignal::new(config.direction);
	let guard = StoredValue::new(RefreshGuard::default());

	let refresh = move || {
		let mut ticket = None;
		guard.update_value(|g| ticket = Some(g.begin()));
		let Some(ticket) = ticket else {
			return;
		};
		loading.set(true);
		let client = client.clone();
		spawn_local(async move {
			let result = load(&client, page_size).await;
			if !guard.with_value(|g| g.is_current(ticket)) {
				warn!("discarding graph data from a superseded refresh");
				return;
			}
			match result {
				Ok((objects, snapshot)) => {
					let (mut built, stats) = graph::build_from_snapshot(&objects, &snapshot);
					graph::layout(&mut built, direction.get_untracked(), node_size, &DagreLayout);
					info!(
						"graph ready: {} nodes, {} edges ({} dangling references dropped)",
						built.nodes.len(),
						built.edges.len(),
						stats.dangling_types + stats.dangling_targets + stats.dangling_steps
					);
					graph_data.set(built);
				}
				Err(err) => {
					error!("Failed to fetch data for graph: {err}");
					graph_data.set(Graph::default());
				}
			}
			loading.set(false);
		});
	};

	refresh();
	let refresh_click = refresh.clone();

	let toggle_direction = move |_| {
		let next = direction.get_untracked().toggled();
		direction.set(next);
		graph_data.update(|g| graph::layout(g, next, node_size, &DagreLayout));
	};

	// The canvas stays mounted across refreshes; loading and empty states
	// are drawn over it.
	view! {
		<div class="data-page">
			<header class="data-page-header">
				<h2>"Data Workflow View"</h2>
				<Show when=move || loading.get()>
					<span class="spinner spinner-sm" />
				</Show>
				<div class="data-page-actions">
					<button on:click=toggle_direction>
						{move || format!("Layout: {}", direction.get())}
					</button>
					<button on:click=move |_| refresh_click() disabled=move || loading.get()>
						"Refresh"
					</button>
				</div>
			</header>
			<div class="data-page-graph">
				<RelationGraphCanvas graph=graph_data node_size=node_size />
				<Show when=move || !loading.get() && graph_data.with(Graph::is_empty)>
					<p class="data-page-empty">"No data to display."</p>
				</Show>
				<Show when=move || loading.get()>
					<div class="data-page-overlay spinner-container">
						<span class="spinner spinner-xl" />
					</div>
				</Show>
			</div>
		</div>
	}
}
