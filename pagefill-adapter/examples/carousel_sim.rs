use std::cell::RefCell;
use std::rc::Rc;

use pagefill::{Lifecycle, Page, PageCompletion, PageRequest, PaginatedSource};
use pagefill_adapter::headless::HeadlessView;
use pagefill_adapter::{AdapterOptions, DEFAULT_STATE_CACHE_KEY, LayoutState, SubListContent};

#[derive(Debug, Default)]
struct Poster {
    title: String,
}

type Parked = Rc<RefCell<Vec<(PageRequest, PageCompletion<String>)>>>;

fn resolve(parked: &Parked, has_more: bool) {
    let next = parked.borrow_mut().pop();
    if let Some((request, completion)) = next {
        let items = (0..4)
            .map(|i| format!("movie #{}", request.offset + i))
            .collect();
        completion.finish(Page::new(items, has_more));
    }
}

fn main() -> Result<(), pagefill_adapter::Error> {
    // Example: a movie carousel inside a host list, driven by a headless view.
    //
    // The host runs layout passes and scroll gestures; the carousel fills its viewport, then
    // loads more when the user scrolls close to the end.
    let parked: Parked = Rc::default();
    let source = PaginatedSource::new({
        let parked = Rc::clone(&parked);
        move |request: PageRequest, completion: PageCompletion<String>| {
            println!("fetch page={} offset={}", request.page_index, request.offset);
            parked.borrow_mut().push((request, completion));
        }
    });

    let screen = Rc::new(Lifecycle::new());
    let description = SubListContent::<HeadlessView<Poster>, _, _>::paginated(source.clone(), Poster::default)
        .view(|| Rc::new(HeadlessView::new(120, 360)))
        .item_binder(|poster: &mut Poster, title: &String| poster.title = title.clone())
        .lifecycle_owner(screen.clone())
        .options(AdapterOptions::new().with_load_more_threshold(0.8))
        .build()?;

    let mut holder = description.create_view_holder();
    description.bind_view_holder(&mut holder)?;
    let view = Rc::clone(holder.view());

    view.layout();
    while !parked.borrow().is_empty() {
        resolve(&parked, source.pages_loaded() < 3);
        view.layout();
    }
    let adapter = holder.adapter();
    println!(
        "after fill: phase={:?} loaded={} inserted={:?}",
        adapter.as_ref().map(|a| a.phase()),
        source.len(),
        view.inserted()
    );

    view.scroll_to(250);
    resolve(&parked, true);
    view.layout();
    view.with_holders(|holders| {
        for (position, poster) in holders {
            println!("  [{position}] {}", poster.title);
        }
    });

    screen.destroy();
    let saved = description.cache().get::<LayoutState>(DEFAULT_STATE_CACHE_KEY);
    println!("destroyed: saved={saved:?} observers={}", source.observer_count());
    Ok(())
}
