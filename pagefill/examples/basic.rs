use std::cell::RefCell;
use std::rc::Rc;

use pagefill::{FillProgress, Page, PageCompletion, PageCursor, PageRequest, PaginatedSource};

fn main() {
    // Example: drive a paginated source by hand, the way a sub-list adapter does.
    //
    // Fetches are parked and resolved later, like network calls finishing on a later tick.
    let parked: Rc<RefCell<Vec<(PageRequest, PageCompletion<String>)>>> = Rc::default();
    let source = PaginatedSource::new({
        let parked = Rc::clone(&parked);
        move |request: PageRequest, completion: PageCompletion<String>| {
            println!("fetch page={} offset={}", request.page_index, request.offset);
            parked.borrow_mut().push((request, completion));
        }
    });

    let mut cursor = PageCursor::from_progress(source.state().progress());
    let _sub = source.observe(move |state| {
        if let Some(inserted) = state.accept(&mut cursor) {
            println!(
                "insert {inserted:?} (loaded={}, has_more={})",
                state.len(),
                state.has_more()
            );
        }
    });

    // Pretend the viewport fits 3 items and each page brings 2.
    let viewport = 3usize;
    let mut fill = FillProgress::default();
    source.load_more();
    source.load_more(); // coalesced

    for round in 0..5 {
        let next = parked.borrow_mut().pop();
        let Some((request, completion)) = next else {
            break;
        };
        let items = (0..2)
            .map(|i| format!("movie #{}", request.offset + i))
            .collect();
        completion.finish(Page::new(items, round < 3));

        // Last completely visible position after layout.
        let last_visible = source.len().min(viewport).checked_sub(1);
        if fill.advance(source.has_more(), last_visible) {
            source.load_more();
        }
    }

    println!(
        "fill={fill:?} loaded={} pages={}",
        source.len(),
        source.pages_loaded()
    );
}
