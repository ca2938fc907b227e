use crate::headless::{HeadlessLinearLayout, HeadlessView};
use crate::*;

use alloc::rc::Rc;
use alloc::vec;
use alloc::vec::Vec;
use core::any::Any;
use core::cell::{Cell, RefCell};

use pagefill::{
    FillOutcome, FillPhase, FillProgress, Lifecycle, Page, PageCompletion, PageRequest,
    PaginatedSource, PaginatedState,
};

#[derive(Debug, Default)]
struct ItemHolder {
    value: Option<u32>,
}

type View = HeadlessView<ItemHolder>;
type Paged = PaginatedState<u32>;
type Holder = SubListViewHolder<View, Paged, u32>;

/// Parks completions until the test resolves them.
#[derive(Default)]
struct Deferred {
    requests: RefCell<Vec<(PageRequest, PageCompletion<u32>)>>,
    issued: Cell<usize>,
}

impl Deferred {
    fn source(self: &Rc<Self>) -> PaginatedSource<u32> {
        self.source_with(Vec::new(), true)
    }

    fn source_with(self: &Rc<Self>, items: Vec<u32>, has_more: bool) -> PaginatedSource<u32> {
        let loader = Rc::clone(self);
        PaginatedSource::with_initial(
            items,
            has_more,
            move |request: PageRequest, completion: PageCompletion<u32>| {
                loader.issued.set(loader.issued.get() + 1);
                loader.requests.borrow_mut().push((request, completion));
            },
        )
    }

    fn issued(&self) -> usize {
        self.issued.get()
    }

    fn finish(&self, count: u32, has_more: bool) {
        let (request, completion) = self.requests.borrow_mut().remove(0);
        let start = request.offset as u32;
        completion.finish(Page::new((start..start + count).collect(), has_more));
    }

    fn fail(&self) {
        let (_, completion) = self.requests.borrow_mut().remove(0);
        completion.fail("offline");
    }
}

/// Items 100 wide in a 300 wide viewport.
fn carousel(source: PaginatedSource<u32>) -> SubListContent<View, Paged, u32> {
    SubListContent::paginated(source, ItemHolder::default)
        .view(|| Rc::new(HeadlessView::new(100, 300)))
        .item_binder(|holder: &mut ItemHolder, item: &u32| holder.value = Some(*item))
}

fn bind(description: &ContentDescription<Paged, Holder>) -> (Holder, Rc<View>) {
    let mut holder = description.create_view_holder();
    description.bind_view_holder(&mut holder).unwrap();
    let view = Rc::clone(holder.view());
    (holder, view)
}

fn bound_values(view: &View) -> Vec<Option<u32>> {
    view.with_holders(|holders| holders.iter().map(|(_, h)| h.value).collect())
}

#[test]
fn pages_are_inserted_after_the_loaded_prefix() {
    let loader = Rc::new(Deferred::default());
    let description = carousel(loader.source()).build().unwrap();
    let (holder, view) = bind(&description);
    assert_eq!(loader.issued(), 1);

    loader.finish(7, true);
    loader.finish(3, true);

    assert_eq!(view.inserted(), [0..7, 7..10]);
    assert_eq!(view.item_count(), 10);
    assert_eq!(holder.adapter().unwrap().cursor(), pagefill::PageCursor::new(10, true));
}

#[test]
fn initial_fill_runs_until_the_viewport_is_full() {
    let loader = Rc::new(Deferred::default());
    let description = carousel(loader.source()).build().unwrap();
    let (holder, view) = bind(&description);
    let adapter = holder.adapter().unwrap();
    assert_eq!(adapter.phase(), FillPhase::FillingInitial);

    // First layout while the first page is in flight: coalesced, listener removed.
    view.layout();
    assert_eq!(loader.issued(), 1);
    assert_eq!(view.layout_listener_count(), 0);

    // Each page is laid out before the next one arrives.
    loader.finish(2, true);
    assert_eq!(loader.issued(), 2);
    view.layout();
    loader.finish(2, true);
    assert_eq!(loader.issued(), 3);
    view.layout();
    loader.finish(2, true);
    assert_eq!(loader.issued(), 4);
    view.layout();

    // Last completely visible position stays at 2: the viewport is satisfied.
    loader.finish(2, true);
    assert_eq!(loader.issued(), 4);
    assert_eq!(
        adapter.fill_progress(),
        FillProgress::Complete(FillOutcome::Saturated)
    );
    assert_eq!(adapter.phase(), FillPhase::AwaitingScroll);

    view.layout();
    assert_eq!(bound_values(&view), [Some(0), Some(1), Some(2)]);
}

#[test]
fn scrolling_past_threshold_requests_next_page() {
    let loader = Rc::new(Deferred::default());
    let source = loader.source_with((0..8).collect(), true);
    let options = AdapterOptions::new().with_initial_fill(false);
    let description = carousel(source).options(options).build().unwrap();
    let (holder, view) = bind(&description);
    let adapter = holder.adapter().unwrap();
    view.layout();
    assert_eq!(loader.issued(), 0);
    assert_eq!(adapter.phase(), FillPhase::AwaitingScroll);

    // Scrollable range is 800 - 300 = 500; the trigger needs an offset past 400.
    view.scroll_to(400);
    assert_eq!(loader.issued(), 0);
    view.scroll_to(401);
    assert_eq!(loader.issued(), 1);

    // Further scroll events while the page is in flight are coalesced.
    view.fling_to(500);
    assert_eq!(loader.issued(), 1);

    loader.finish(2, false);
    assert_eq!(view.inserted(), [8..10]);
    assert_eq!(adapter.phase(), FillPhase::FillComplete);

    view.layout();
    view.scroll_to(700);
    assert_eq!(loader.issued(), 1);
}

#[test]
fn custom_threshold_moves_the_trigger_point() {
    let loader = Rc::new(Deferred::default());
    let source = loader.source_with((0..8).collect(), true);
    let options = AdapterOptions::new()
        .with_initial_fill(false)
        .with_load_more_threshold(0.5);
    let description = carousel(source).options(options).build().unwrap();
    let (_holder, view) = bind(&description);
    view.layout();

    view.scroll_to(251);
    assert_eq!(loader.issued(), 1);
}

#[test]
fn underfilled_viewport_never_scroll_triggers() {
    let loader = Rc::new(Deferred::default());
    let source = loader.source_with(vec![0, 1], true);
    let options = AdapterOptions::new().with_initial_fill(false);
    let description = carousel(source).options(options).build().unwrap();
    let (_holder, view) = bind(&description);
    view.layout();

    view.scroll_to(100);
    view.fling_to(300);
    assert_eq!(view.offset(), 0);
    assert_eq!(loader.issued(), 0);
}

#[test]
fn exhausted_first_page_completes_the_fill() {
    let loader = Rc::new(Deferred::default());
    let description = carousel(loader.source()).build().unwrap();
    let (holder, view) = bind(&description);

    loader.finish(2, false);
    let adapter = holder.adapter().unwrap();
    assert_eq!(adapter.phase(), FillPhase::FillComplete);

    view.layout();
    view.scroll_to(100);
    assert_eq!(loader.issued(), 1);
}

#[test]
fn empty_page_with_more_data_is_ignored() {
    let loader = Rc::new(Deferred::default());
    let description = carousel(loader.source()).build().unwrap();
    let (holder, view) = bind(&description);

    loader.finish(0, true);
    assert!(view.inserted().is_empty());
    assert_eq!(loader.issued(), 1);
    assert_eq!(holder.adapter().unwrap().fill_progress(), FillProgress::NotStarted);

    // The first layout pass requests again.
    view.layout();
    assert_eq!(loader.issued(), 2);
}

#[test]
fn empty_terminal_page_ends_the_fill_without_inserting() {
    let loader = Rc::new(Deferred::default());
    let description = carousel(loader.source()).build().unwrap();
    let (holder, view) = bind(&description);

    loader.finish(3, true);
    assert_eq!(loader.issued(), 2);
    loader.finish(0, false);

    assert_eq!(view.inserted(), [0..3]);
    let adapter = holder.adapter().unwrap();
    assert_eq!(
        adapter.fill_progress(),
        FillProgress::Complete(FillOutcome::Exhausted)
    );
    assert_eq!(adapter.cursor(), pagefill::PageCursor::new(3, false));
}

#[test]
fn failed_page_is_retried_by_the_first_layout() {
    let loader = Rc::new(Deferred::default());
    let description = carousel(loader.source()).build().unwrap();
    let (_holder, view) = bind(&description);

    loader.fail();
    assert!(view.inserted().is_empty());

    view.layout();
    assert_eq!(loader.issued(), 2);
    loader.finish(4, true);
    assert_eq!(view.inserted(), [0..4]);
}

#[test]
fn paginated_data_rejects_non_linear_or_vertical_layouts() {
    let loader = Rc::new(Deferred::default());
    let description = carousel(loader.source())
        .layout_manager(|_: &View| -> Rc<dyn LayoutManager> {
            Rc::new(HeadlessLinearLayout::new(Orientation::Vertical, 100, 300))
        })
        .build()
        .unwrap();
    let mut holder = description.create_view_holder();

    let err = description.bind_view_holder(&mut holder).unwrap_err();
    assert_eq!(
        err,
        Error::IncompatibleLayoutManager {
            kind: LayoutKind::Linear,
            orientation: Orientation::Vertical,
        }
    );
    assert_eq!(loader.issued(), 0);
    assert!(!holder.view().has_adapter());
    assert!(holder.adapter().is_none());

    let staggered =
        HeadlessLinearLayout::horizontal(100, 300).with_kind(LayoutKind::StaggeredGrid { spans: 2 });
    assert!(check_layout_manager(&staggered, true).is_err());
    assert!(check_layout_manager(&staggered, false).is_ok());

    let grid = HeadlessLinearLayout::horizontal(100, 300).with_kind(LayoutKind::Grid { spans: 2 });
    assert!(check_layout_manager(&grid, true).is_ok());
}

#[test]
fn static_data_accepts_any_layout() {
    let description = SubListContent::<View, Vec<u32>, u32>::from_items(
        vec![10, 20, 30, 40],
        ItemHolder::default,
    )
    .view(|| Rc::new(HeadlessView::new(100, 300)))
    .layout_manager(|_: &View| -> Rc<dyn LayoutManager> {
        Rc::new(HeadlessLinearLayout::new(Orientation::Vertical, 100, 300))
    })
    .item_binder(|holder: &mut ItemHolder, item: &u32| holder.value = Some(*item))
    .build()
    .unwrap();

    let mut holder = description.create_view_holder();
    description.bind_view_holder(&mut holder).unwrap();
    let view = Rc::clone(holder.view());
    view.layout();

    assert_eq!(bound_values(&view), [Some(10), Some(20), Some(30)]);
    assert_eq!(view.scroll_listener_count(), 0);
    assert_eq!(view.layout_listener_count(), 0);
    assert_eq!(holder.adapter().unwrap().phase(), FillPhase::Idle);
}

#[test]
fn default_view_holder_requires_a_view_factory() {
    let err = SubListContent::<View, Vec<u32>, u32>::from_items(vec![1], ItemHolder::default)
        .build()
        .unwrap_err();
    assert_eq!(err, Error::MissingViewFactory);
}

#[test]
fn destroy_tears_down_every_registration_once() {
    let lifecycle = Rc::new(Lifecycle::new());
    let loader = Rc::new(Deferred::default());
    let source = loader.source();
    let description = carousel(source.clone())
        .lifecycle_owner(lifecycle.clone())
        .build()
        .unwrap();
    let (mut holder, view) = bind(&description);
    let adapter = holder.adapter().unwrap();

    assert_eq!(source.observer_count(), 1);
    assert_eq!(view.scroll_listener_count(), 1);
    assert_eq!(view.layout_listener_count(), 1);
    assert_eq!(lifecycle.observer_count(), 1);

    lifecycle.destroy();
    lifecycle.destroy();

    assert_eq!(source.observer_count(), 0);
    assert_eq!(view.scroll_listener_count(), 0);
    assert_eq!(view.layout_listener_count(), 0);
    assert_eq!(lifecycle.observer_count(), 0);
    assert!(!adapter.is_attached());
    assert_eq!(adapter.phase(), FillPhase::Idle);
    assert!(holder.adapter().is_none());

    // Late completions and events find nobody listening.
    loader.finish(5, true);
    view.layout();
    view.scroll_to(200);
    assert!(view.inserted().is_empty());
    assert_eq!(loader.issued(), 1);

    holder.recycle();
    assert_eq!(source.observer_count(), 0);
}

#[test]
fn binding_under_a_destroyed_owner_releases_immediately() {
    let lifecycle = Rc::new(Lifecycle::new());
    lifecycle.destroy();
    let loader = Rc::new(Deferred::default());
    let source = loader.source();
    let description = carousel(source.clone())
        .lifecycle_owner(lifecycle.clone())
        .build()
        .unwrap();
    let (holder, view) = bind(&description);

    assert!(holder.adapter().is_none());
    assert_eq!(source.observer_count(), 0);
    assert_eq!(view.scroll_listener_count(), 0);
    assert_eq!(view.layout_listener_count(), 0);
}

#[test]
fn rebinding_releases_the_previous_binding() {
    let loader = Rc::new(Deferred::default());
    let source = loader.source();
    let description = carousel(source.clone()).build().unwrap();
    let (mut holder, view) = bind(&description);
    let first = holder.adapter().unwrap();

    description.bind_view_holder(&mut holder).unwrap();
    let second = holder.adapter().unwrap();

    assert!(!first.is_attached());
    assert!(second.is_attached());
    assert_eq!(source.observer_count(), 1);
    assert_eq!(view.scroll_listener_count(), 1);
    assert_eq!(view.layout_listener_count(), 1);
}

#[test]
fn dropping_holders_without_an_owner_releases_their_bindings() {
    let loader = Rc::new(Deferred::default());
    let source = loader.source();
    let description = carousel(source.clone()).build().unwrap();
    let bound: Vec<_> = (0..3).map(|_| bind(&description)).collect();
    let views: Vec<_> = bound.iter().map(|(_, view)| Rc::clone(view)).collect();
    assert_eq!(source.observer_count(), 3);

    drop(bound);

    assert_eq!(source.observer_count(), 0);
    for view in &views {
        assert!(!view.has_adapter());
        assert_eq!(view.scroll_listener_count(), 0);
        assert_eq!(view.layout_listener_count(), 0);
    }

    loader.finish(5, true);
    for view in &views {
        view.layout();
        view.scroll_to(200);
        assert!(view.inserted().is_empty());
    }
    assert_eq!(loader.issued(), 1);
}

#[test]
fn scroll_position_survives_recycling() {
    let loader = Rc::new(Deferred::default());
    let source = loader.source_with((0..10).collect(), true);
    let options = AdapterOptions::new().with_initial_fill(false);
    let description = carousel(source).options(options).build().unwrap();
    let (mut holder, view) = bind(&description);
    view.layout();
    view.scroll_to(250);
    holder.recycle();
    assert!(!view.has_adapter());

    let saved = LayoutState {
        anchor_position: Some(2),
        anchor_offset: -50,
    };
    assert_eq!(
        description.cache().get::<LayoutState>(DEFAULT_STATE_CACHE_KEY),
        Some(saved)
    );

    // The saved state reaches the new layout manager before any layout pass.
    let (next, next_view) = bind(&description);
    let layout = next.layout_manager().unwrap();
    assert_eq!(layout.save_state(), Some(saved));

    next_view.layout();
    assert_eq!(next_view.offset(), 250);
    assert_eq!(next_view.bound_positions(), [2, 3, 4, 5]);
}

#[test]
fn recycled_holder_opens_a_fresh_block_at_its_start() {
    let loader = Rc::new(Deferred::default());
    let source = loader.source_with((0..10).collect(), true);
    let binding = ItemBinding::new(
        |state: &Paged| state.len(),
        |state: &Paged, position| state.loaded()[position],
        ItemHolder::default,
    );
    let config = HolderConfig::<View, Paged, u32>::new(binding)
        .with_source(Rc::new(source.clone()))
        .with_options(AdapterOptions::new().with_initial_fill(false));
    let mut holder = SubListViewHolder::new(Rc::new(HeadlessView::new(100, 300)), config);
    let view = Rc::clone(holder.view());

    let scrolled = DescriptionCache::new();
    holder.bind(&scrolled, Some(&source.state())).unwrap();
    view.layout();
    view.scroll_to(250);
    holder.recycle();

    let fresh = DescriptionCache::new();
    holder.bind(&fresh, Some(&source.state())).unwrap();
    view.layout();
    assert_eq!(view.offset(), 0);
    assert_eq!(view.bound_positions(), [0, 1, 2]);

    // Back on the scrolled block, its own position comes back.
    holder.recycle();
    holder.bind(&scrolled, Some(&source.state())).unwrap();
    view.layout();
    assert_eq!(view.offset(), 250);
}

#[test]
fn scroll_position_saved_on_destroy_is_restored_before_any_insert() {
    let loader = Rc::new(Deferred::default());
    let source = loader.source_with((0..10).collect(), true);
    let binding = ItemBinding::new(
        |state: &Paged| state.len(),
        |state: &Paged, position| state.loaded()[position],
        ItemHolder::default,
    );
    let config =
        HolderConfig::<View, Paged, u32>::new(binding).with_source(Rc::new(source.clone()));
    let cache = DescriptionCache::new();

    let first_screen = Rc::new(Lifecycle::new());
    let mut first = SubListViewHolder::new(
        Rc::new(HeadlessView::new(100, 300)),
        config.clone().with_lifecycle(first_screen.clone()),
    );
    first.bind(&cache, Some(&source.state())).unwrap();
    first.view().layout();
    first.view().scroll_to(320);
    first_screen.destroy();

    let second_screen = Rc::new(Lifecycle::new());
    let mut second = SubListViewHolder::new(
        Rc::new(HeadlessView::new(100, 300)),
        config.with_lifecycle(second_screen.clone()),
    );
    second.bind(&cache, Some(&source.state())).unwrap();

    let saved = LayoutState {
        anchor_position: Some(3),
        anchor_offset: -20,
    };
    assert_eq!(second.layout_manager().unwrap().save_state(), Some(saved));
    assert!(second.view().inserted().is_empty());

    second.view().layout();
    assert_eq!(second.view().offset(), 320);
}

#[test]
fn custom_state_cache_key_is_honored() {
    let loader = Rc::new(Deferred::default());
    let source = loader.source_with((0..10).collect(), true);
    let options = AdapterOptions::new()
        .with_initial_fill(false)
        .with_state_cache_key("row_7");
    let description = carousel(source).options(options).build().unwrap();
    let (mut holder, view) = bind(&description);
    view.layout();
    view.scroll_to(100);
    holder.recycle();

    assert!(description.cache().contains("row_7"));
    assert!(!description.cache().contains(DEFAULT_STATE_CACHE_KEY));
}

#[test]
fn sub_lists_page_independently() {
    let first_loader = Rc::new(Deferred::default());
    let second_loader = Rc::new(Deferred::default());
    let first = carousel(first_loader.source()).build().unwrap();
    let second = carousel(second_loader.source()).build().unwrap();
    let (_first_holder, first_view) = bind(&first);
    let (_second_holder, second_view) = bind(&second);

    first_loader.finish(4, true);

    assert_eq!(first_view.inserted(), [0..4]);
    assert!(second_view.inserted().is_empty());
    assert_eq!(second_loader.issued(), 1);
}

#[derive(Default)]
struct Summary {
    binder_runs: usize,
    bound: Vec<Option<usize>>,
    recycled: bool,
}

impl ContentViewHolder<Vec<u32>> for Summary {
    fn bind(&mut self, _cache: &DescriptionCache, data: Option<&Vec<u32>>) -> Result<()> {
        self.bound.push(data.map(Vec::len));
        Ok(())
    }

    fn recycle(&mut self) {
        self.recycled = true;
    }
}

#[test]
fn custom_view_holder_needs_no_view_factory() {
    let description =
        SubListContent::<View, Vec<u32>, u32>::from_items(vec![1, 2, 3], ItemHolder::default)
            .view_holder(|_config| Summary::default())
            .view_binder(|holder: &mut Summary| holder.binder_runs += 1)
            .build()
            .unwrap();

    let mut holder = description.create_view_holder();
    description.bind_view_holder(&mut holder).unwrap();
    holder.recycle();

    assert_eq!(holder.binder_runs, 1);
    assert_eq!(holder.bound, [Some(3)]);
    assert!(holder.recycled);
}

#[test]
fn reload_hook_receives_the_payload() {
    let seen = Rc::new(Cell::new(None));
    let description =
        SubListContent::<View, Vec<u32>, u32>::from_items(vec![1, 2], ItemHolder::default)
            .view(|| Rc::new(HeadlessView::new(100, 300)))
            .on_reload({
                let seen = Rc::clone(&seen);
                move |_, payload: Option<&dyn Any>| {
                    seen.set(payload.and_then(|p| p.downcast_ref::<u32>()).copied());
                }
            })
            .build()
            .unwrap();

    description.reload(Some(&7u32));
    assert_eq!(seen.get(), Some(7));
    description.reload(None);
    assert_eq!(seen.get(), None);
}

#[test]
fn options_defaults() {
    let options = AdapterOptions::default();
    assert_eq!(options.load_more_threshold, pagefill::DEFAULT_LOAD_MORE_THRESHOLD);
    assert_eq!(options.state_cache_key, DEFAULT_STATE_CACHE_KEY);
    assert!(options.initial_fill);
    assert_eq!(
        AdapterOptions::new().with_load_more_threshold(3.0).scroll_trigger().threshold(),
        1.0
    );
}

#[test]
fn description_cache_is_typed() {
    let cache = DescriptionCache::new();
    cache.put("answer", 42u32);
    assert_eq!(cache.get::<u32>("answer"), Some(42));
    assert_eq!(cache.get::<i64>("answer"), None);

    let shared = cache.clone();
    assert!(shared.remove("answer"));
    assert!(cache.is_empty());
}

#[cfg(feature = "serde")]
#[test]
fn layout_state_serializes_for_persistent_caches() {
    let state = LayoutState {
        anchor_position: Some(4),
        anchor_offset: -12,
    };
    let json = serde_json::to_string(&state).unwrap();
    assert_eq!(serde_json::from_str::<LayoutState>(&json).unwrap(), state);
}
