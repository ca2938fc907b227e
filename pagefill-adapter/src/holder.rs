use alloc::rc::{Rc, Weak};
use core::cell::Cell;
use core::fmt;

use pagefill::{LifecycleObserver, LifecycleOwner, ObserverKey, PagedData};

use crate::{
    AdapterOptions, DescriptionCache, ItemBinding, LayoutManager, LayoutState, Orientation,
    Result, ScrollMemento, ScrollableView, SubListAdapter, check_layout_manager,
};

/// The host-list side of a content description: something that can be bound to data and
/// recycled.
pub trait ContentViewHolder<D> {
    /// Binds `data`. `None` leaves the holder untouched.
    fn bind(&mut self, cache: &DescriptionCache, data: Option<&D>) -> Result<()>;

    /// Releases the current binding before the holder is reused.
    fn recycle(&mut self);
}

/// Everything a [`SubListViewHolder`] needs besides its view.
pub struct HolderConfig<V: ScrollableView, D, I> {
    pub(crate) binding: ItemBinding<D, I, V::ItemHolder>,
    pub(crate) layout_manager: Option<Rc<dyn Fn(&V) -> Rc<dyn LayoutManager>>>,
    pub(crate) source: Option<Rc<dyn PagedData<D>>>,
    pub(crate) lifecycle: Option<Rc<dyn LifecycleOwner>>,
    pub(crate) options: AdapterOptions,
}

impl<V: ScrollableView, D, I> HolderConfig<V, D, I> {
    pub fn new(binding: ItemBinding<D, I, V::ItemHolder>) -> Self {
        Self {
            binding,
            layout_manager: None,
            source: None,
            lifecycle: None,
            options: AdapterOptions::default(),
        }
    }

    pub fn with_source(mut self, source: Rc<dyn PagedData<D>>) -> Self {
        self.source = Some(source);
        self
    }

    /// Overrides the host's default horizontal linear layout manager.
    pub fn with_layout_manager(
        mut self,
        factory: impl Fn(&V) -> Rc<dyn LayoutManager> + 'static,
    ) -> Self {
        self.layout_manager = Some(Rc::new(factory));
        self
    }

    pub fn with_lifecycle(mut self, owner: Rc<dyn LifecycleOwner>) -> Self {
        self.lifecycle = Some(owner);
        self
    }

    pub fn with_options(mut self, options: AdapterOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &AdapterOptions {
        &self.options
    }
}

impl<V: ScrollableView, D, I> Clone for HolderConfig<V, D, I> {
    fn clone(&self) -> Self {
        Self {
            binding: self.binding.clone(),
            layout_manager: self.layout_manager.clone(),
            source: self.source.clone(),
            lifecycle: self.lifecycle.clone(),
            options: self.options.clone(),
        }
    }
}

impl<V: ScrollableView, D, I> fmt::Debug for HolderConfig<V, D, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HolderConfig")
            .field("paginated", &self.source.is_some())
            .field("lifecycle", &self.lifecycle.is_some())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// The default view holder for a sub-list: one scrollable view plus the adapter bound to it.
///
/// The layout manager is created on the first bind and checked before anything is fetched.
/// Each bind restores the saved scroll position before the adapter attaches. The binding is
/// released exactly once, by whichever comes first of the owner's destroy event, a rebind,
/// [`recycle`](ContentViewHolder::recycle) or dropping the holder; releasing saves the scroll
/// position.
pub struct SubListViewHolder<V: ScrollableView, D, I> {
    view: Rc<V>,
    config: HolderConfig<V, D, I>,
    layout_manager: Option<Rc<dyn LayoutManager>>,
    bound: Option<Rc<BoundSubList<V, D, I>>>,
}

impl<V, D, I> SubListViewHolder<V, D, I>
where
    V: ScrollableView + 'static,
    D: Clone + 'static,
    I: 'static,
{
    pub fn new(view: Rc<V>, config: HolderConfig<V, D, I>) -> Self {
        Self {
            view,
            config,
            layout_manager: None,
            bound: None,
        }
    }

    pub fn view(&self) -> &Rc<V> {
        &self.view
    }

    /// The adapter of the current binding.
    pub fn adapter(&self) -> Option<Rc<SubListAdapter<V, D, I>>> {
        self.bound
            .as_ref()
            .filter(|bound| !bound.released.get())
            .map(|bound| Rc::clone(&bound.adapter))
    }

    pub fn layout_manager(&self) -> Option<&Rc<dyn LayoutManager>> {
        self.layout_manager.as_ref()
    }

    fn ensure_layout_manager(&mut self) -> Result<Rc<dyn LayoutManager>> {
        if let Some(layout) = &self.layout_manager {
            return Ok(Rc::clone(layout));
        }
        let layout = match &self.config.layout_manager {
            Some(factory) => factory(&self.view),
            None => self.view.create_linear_layout_manager(Orientation::Horizontal),
        };
        check_layout_manager(&*layout, self.config.source.is_some())?;
        self.view.set_layout_manager(Rc::clone(&layout));
        self.layout_manager = Some(Rc::clone(&layout));
        Ok(layout)
    }
}

impl<V: ScrollableView, D, I> SubListViewHolder<V, D, I> {
    fn release(&mut self) {
        if let Some(bound) = self.bound.take() {
            bound.release();
        }
    }
}

impl<V: ScrollableView, D, I> Drop for SubListViewHolder<V, D, I> {
    fn drop(&mut self) {
        self.release();
        self.view.set_adapter(None);
    }
}

impl<V, D, I> ContentViewHolder<D> for SubListViewHolder<V, D, I>
where
    V: ScrollableView + 'static,
    D: Clone + 'static,
    I: 'static,
{
    fn bind(&mut self, cache: &DescriptionCache, data: Option<&D>) -> Result<()> {
        let Some(data) = data else {
            return Ok(());
        };
        self.release();

        let layout = self.ensure_layout_manager()?;
        let key = self.config.options.state_cache_key.clone();
        let memento = ScrollMemento::new(cache.clone(), key);
        if !memento.restore(&*layout) {
            // A block without a saved position opens at its start.
            layout.restore_state(&LayoutState::default());
        }

        let adapter = SubListAdapter::new(
            data.clone(),
            self.config.binding.clone(),
            self.config.source.clone(),
            &self.config.options,
        );
        self.view.set_adapter(Some(adapter.clone()));
        adapter.attach(&self.view);

        let bound = Rc::new(BoundSubList {
            adapter,
            layout,
            memento,
            owner: self.config.lifecycle.as_ref().map(Rc::downgrade),
            registration: Cell::new(None),
            released: Cell::new(false),
        });
        if let Some(owner) = &self.config.lifecycle {
            let key = owner.add_observer(bound.clone());
            // An owner that is already destroyed releases the binding inside `add_observer`.
            if !bound.released.get() {
                bound.registration.set(Some(key));
            }
        }
        self.bound = Some(bound);
        Ok(())
    }

    fn recycle(&mut self) {
        pdebug!("SubListViewHolder::recycle");
        self.release();
        self.view.set_adapter(None);
    }
}

impl<V: ScrollableView, D, I> fmt::Debug for SubListViewHolder<V, D, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubListViewHolder")
            .field("config", &self.config)
            .field("bound", &self.bound.is_some())
            .finish_non_exhaustive()
    }
}

/// One bind of a [`SubListViewHolder`]. Doubles as the lifecycle observer of that bind.
struct BoundSubList<V: ScrollableView, D, I> {
    adapter: Rc<SubListAdapter<V, D, I>>,
    layout: Rc<dyn LayoutManager>,
    memento: ScrollMemento,
    owner: Option<Weak<dyn LifecycleOwner>>,
    registration: Cell<Option<ObserverKey>>,
    released: Cell<bool>,
}

impl<V: ScrollableView, D, I> BoundSubList<V, D, I> {
    fn release(&self) {
        if self.released.replace(true) {
            return;
        }
        pdebug!("SubListViewHolder: release binding");
        self.adapter.detach();
        let owner = self.owner.as_ref().and_then(Weak::upgrade);
        if let (Some(owner), Some(key)) = (owner, self.registration.take()) {
            owner.remove_observer(key);
        }
        self.memento.save(&*self.layout);
    }
}

impl<V, D, I> LifecycleObserver for BoundSubList<V, D, I>
where
    V: ScrollableView + 'static,
    D: Clone + 'static,
    I: 'static,
{
    fn on_destroy(&self) {
        self.release();
    }
}
