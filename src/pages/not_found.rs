use leptos::prelude::*;

/// 404 Not Found Page
#[component]
pub fn NotFound() -> impl IntoView {
	view! {
		<div class="not-found">
			<h1>"Uh oh!"</h1>
			<p>"We couldn't find that page."</p>
			<a href="/">"Back to the data view"</a>
		</div>
	}
}
