use leptos::prelude::*;
use tier_topology::{App, init_logging};

fn main() {
	init_logging();
	mount_to_body(App);
}
