//! The page-ready entry point.
//!
//! ## Learning: `LocalSet` and `spawn_local`
//!
//! Viewers hold `Rc`/`RefCell` state, which is not `Send`. Instead of
//! wrapping everything in `Arc<Mutex<_>>`, all loads run as local tasks on
//! a single thread, much like callbacks on a UI event loop:
//! - each task owns exactly one `ViewerBinding`
//! - tasks share nothing mutable, so no locking is needed
//! - tasks finish in whatever order their files arrive

use std::rc::Rc;
use tokio::task::{JoinSet, LocalSet};

use crate::binding::ViewerBinding;
use crate::config::ViewerConfig;
use crate::fetch::Fetch;
use crate::page::Page;

/// Sets up and loads a viewer for every qualifying element of a page.
pub struct Initializer<F> {
    config: ViewerConfig,
    fetcher: Rc<F>,
}

impl<F: Fetch + 'static> Initializer<F> {
    pub fn new(config: ViewerConfig, fetcher: F) -> Self {
        Self {
            config,
            fetcher: Rc::new(fetcher),
        }
    }

    /// Runs both phases: synchronous setup of every viewer, then one
    /// independent load per viewer.
    ///
    /// Call once the page is fully built. Consumes the initializer, so a
    /// page's viewers are created exactly once. Returns the bindings in
    /// document order after every load has settled.
    pub async fn run(self, page: &Page) -> Vec<ViewerBinding> {
        let bindings = self.setup(page);
        self.load_all(bindings).await
    }

    /// Creates one binding per qualifying element, in document order.
    ///
    /// Nothing is fetched here.
    fn setup(&self, page: &Page) -> Vec<ViewerBinding> {
        let class = self.config.page.selector_class.as_str();
        let bindings: Vec<_> = page
            .elements_with_class(class)
            .enumerate()
            .map(|(index, element)| {
                ViewerBinding::setup(index, element, &self.config.page, &self.config.viewer)
            })
            .collect();

        tracing::info!(
            "Set up {} viewer(s) for .{} elements",
            bindings.len(),
            class
        );
        bindings
    }

    /// Fetches every pending binding concurrently and applies the results.
    ///
    /// Bindings that are not loading (failed setup) pass through untouched.
    async fn load_all(&self, bindings: Vec<ViewerBinding>) -> Vec<ViewerBinding> {
        let local = LocalSet::new();
        local.run_until(self.spawn_loads(bindings)).await
    }

    async fn spawn_loads(&self, bindings: Vec<ViewerBinding>) -> Vec<ViewerBinding> {
        let mut settled = Vec::with_capacity(bindings.len());
        let mut tasks = JoinSet::new();

        for mut binding in bindings {
            let Some(location) = binding.pending_location().map(str::to_string) else {
                settled.push(binding);
                continue;
            };
            let fetcher = Rc::clone(&self.fetcher);
            let settings = self.config.viewer.clone();

            tasks.spawn_local(async move {
                let result = fetcher.fetch_text(&location).await;
                binding.settle(result, &settings);
                binding
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(binding) => settled.push(binding),
                Err(e) => tracing::error!("Viewer load task failed: {}", e),
            }
        }

        settled.sort_by_key(ViewerBinding::index);
        settled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::Phase;
    use crate::config::ViewerSettings;
    use crate::fetch::{FetchError, FetchResult, SiteFetcher};
    use crate::page::{Element, Em};
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::time::Duration;

    /// Serves canned bodies after a per-location delay and records the
    /// order in which fetches start.
    #[derive(Default)]
    struct ScriptedFetcher {
        bodies: HashMap<String, (u64, Option<String>)>,
        started: Rc<RefCell<Vec<String>>>,
    }

    impl ScriptedFetcher {
        fn serve(mut self, location: &str, delay_ms: u64, body: Option<&str>) -> Self {
            self.bodies
                .insert(location.to_string(), (delay_ms, body.map(str::to_string)));
            self
        }
    }

    impl Fetch for ScriptedFetcher {
        async fn fetch_text(&self, location: &str) -> FetchResult<String> {
            self.started.borrow_mut().push(location.to_string());
            let (delay, body) = self
                .bodies
                .get(location)
                .cloned()
                .unwrap_or((0, None));
            tokio::time::sleep(Duration::from_millis(delay)).await;
            body.ok_or_else(|| FetchError::NotFound(location.to_string()))
        }
    }

    fn numbered(lines: usize) -> String {
        (1..=lines)
            .map(|i| format!("line {i}"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn code(src: &str) -> Element {
        Element::new("div")
            .with_attr("class", "code")
            .with_attr("data-src-file", src)
    }

    fn height(binding: &ViewerBinding) -> f64 {
        binding.element().unwrap().style().height.unwrap().value()
    }

    #[test]
    fn test_setup_creates_one_binding_per_element_without_fetching() {
        let mut page = Page::new(".");
        page.push(code("a.rs"));
        page.push(Element::new("p"));
        page.push(code("b.py"));

        let initializer = Initializer::new(ViewerConfig::default(), ScriptedFetcher::default());
        let bindings = initializer.setup(&page);

        assert_eq!(bindings.len(), 2);
        assert!(bindings.iter().all(|b| b.phase() == Phase::Loading));
        assert!(bindings.iter().all(|b| b.viewer().text() == "Loading..."));
        assert!(initializer.fetcher.started.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_outcomes_are_independent_of_completion_order() {
        let ten = numbered(10);
        let three = numbered(3);

        for (slow, fast) in [(50, 0), (0, 50)] {
            let mut page = Page::new(".");
            page.push(code("ten.txt"));
            page.push(code("missing.txt"));
            page.push(code("three.txt"));

            let fetcher = ScriptedFetcher::default()
                .serve("ten.txt", slow, Some(ten.as_str()))
                .serve("missing.txt", 10, None)
                .serve("three.txt", fast, Some(three.as_str()));
            let initializer = Initializer::new(ViewerConfig::default(), fetcher);
            let bindings = initializer.run(&page).await;

            assert_eq!(bindings.len(), 3);
            assert_eq!(bindings[0].phase(), Phase::Loaded);
            assert_eq!(bindings[0].viewer().text(), ten);
            assert!((height(&bindings[0]) - 11.0).abs() < 1e-9);

            assert_eq!(bindings[1].phase(), Phase::Failed);
            assert_eq!(bindings[1].viewer().text(), "contents not available");
            assert_eq!(height(&bindings[1]), 1.0);

            assert_eq!(bindings[2].phase(), Phase::Loaded);
            assert!((height(&bindings[2]) - 3.3).abs() < 1e-9);
        }
    }

    #[tokio::test]
    async fn test_missing_source_is_never_fetched() {
        let mut page = Page::new(".");
        page.push(Element::new("div").with_attr("class", "code"));
        page.push(code("a.txt"));

        let fetcher = ScriptedFetcher::default().serve("a.txt", 0, Some("x"));
        let started = Rc::clone(&fetcher.started);
        let bindings = Initializer::new(ViewerConfig::default(), fetcher)
            .run(&page)
            .await;

        assert_eq!(bindings[0].phase(), Phase::Failed);
        assert_eq!(bindings[1].phase(), Phase::Loaded);
        assert_eq!(*started.borrow(), vec!["a.txt".to_string()]);
    }

    #[tokio::test]
    async fn test_line_jump_toggle() {
        let body = numbered(80);
        let mut page = Page::new(".");
        page.push(code("a.txt").with_attr("data-line", "42"));
        page.push(code("a.txt"));
        page.push(code("a.txt").with_attr("data-line", "forty-two"));

        let mut config = ViewerConfig::default();
        config.viewer = ViewerSettings {
            line_jump: true,
            ..ViewerSettings::default()
        };
        let fetcher = ScriptedFetcher::default().serve("a.txt", 0, Some(body.as_str()));
        let bindings = Initializer::new(config, fetcher).run(&page).await;

        assert_eq!(bindings[0].viewer().first_visible_line(), 42);
        assert_eq!(bindings[1].viewer().first_visible_line(), 1);
        assert_eq!(bindings[2].viewer().first_visible_line(), 1);

        // Without the toggle the attribute is ignored
        let fetcher = ScriptedFetcher::default().serve("a.txt", 0, Some(body.as_str()));
        let bindings = Initializer::new(ViewerConfig::default(), fetcher)
            .run(&page)
            .await;
        assert_eq!(bindings[0].viewer().first_visible_line(), 1);
    }

    #[tokio::test]
    async fn test_custom_selector_class() {
        let mut page = Page::new(".");
        page.push(code("a.txt"));
        page.push(
            Element::new("pre")
                .with_attr("class", "listing")
                .with_attr("src", "b.txt"),
        );

        let mut config = ViewerConfig::default();
        config.page.selector_class = "listing".to_string();
        config.page.source_attribute = "src".to_string();

        let fetcher = ScriptedFetcher::default().serve("b.txt", 0, Some("b"));
        let bindings = Initializer::new(config, fetcher).run(&page).await;

        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings[0].phase(), Phase::Loaded);
        assert_eq!(page.elements()[0].style().height, None);
    }

    #[tokio::test]
    async fn test_end_to_end_from_markup() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("src")).unwrap();
        std::fs::write(dir.path().join("src").join("ten.rs"), numbered(10)).unwrap();
        std::fs::write(
            dir.path().join("index.html"),
            r#"<html><body>
  <h1>Listing</h1>
  <div class="code" data-src-file="src/ten.rs"></div>
  <div class="code" data-src-file="src/missing.rs"></div>
</body></html>"#,
        )
        .unwrap();

        let page = Page::load(dir.path().join("index.html")).await.unwrap();
        let fetcher = SiteFetcher::new(page.base()).unwrap();
        let bindings = Initializer::new(ViewerConfig::default(), fetcher)
            .run(&page)
            .await;

        assert_eq!(bindings.len(), 2);
        assert_eq!(bindings[0].viewer().line_count(), 10);
        assert_eq!(bindings[0].viewer().mode(), "rs");
        assert!(bindings[0].viewer().is_highlighted());
        assert!((height(&bindings[0]) - 1.1 * 10.0).abs() < 1e-9);

        assert_eq!(bindings[1].viewer().text(), "contents not available");
        assert_eq!(bindings[1].element().unwrap().style().height, Some(Em(1.0)));
    }
}
