use alloc::rc::Rc;
use alloc::vec::Vec;
use core::any::Any;
use core::fmt;

use pagefill::{LifecycleOwner, PagedData, PaginatedSource, PaginatedState};

use crate::{
    AdapterOptions, ContentViewHolder, DescriptionCache, Error, HolderConfig, ItemBinding,
    LayoutManager, Result, ScrollableView, SubListViewHolder,
};

/// The data behind one content description.
pub enum ContentData<D> {
    /// A fixed value, bound as-is.
    Static(D),
    /// A paginated source; binding takes its current snapshot.
    Paginated(Rc<dyn PagedData<D>>),
}

impl<D> ContentData<D> {
    pub fn is_paginated(&self) -> bool {
        matches!(self, Self::Paginated(_))
    }

    pub fn source(&self) -> Option<Rc<dyn PagedData<D>>> {
        match self {
            Self::Static(_) => None,
            Self::Paginated(source) => Some(Rc::clone(source)),
        }
    }
}

impl<D: Clone> ContentData<D> {
    pub fn snapshot(&self) -> D {
        match self {
            Self::Static(data) => data.clone(),
            Self::Paginated(source) => source.snapshot(),
        }
    }
}

impl<D: Clone> Clone for ContentData<D> {
    fn clone(&self) -> Self {
        match self {
            Self::Static(data) => Self::Static(data.clone()),
            Self::Paginated(source) => Self::Paginated(Rc::clone(source)),
        }
    }
}

impl<D> fmt::Debug for ContentData<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(_) => f.write_str("Static"),
            Self::Paginated(source) => f
                .debug_struct("Paginated")
                .field("has_more", &source.has_more())
                .finish(),
        }
    }
}

type ReloadHook<D, H> = Rc<dyn Fn(&ContentDescription<D, H>, Option<&dyn Any>)>;

/// A self-contained unit of content a host list can place: how to create its view holder,
/// how to bind it and what data it shows.
pub struct ContentDescription<D, H> {
    view_holder: Rc<dyn Fn() -> H>,
    view_binder: Rc<dyn Fn(&mut H)>,
    data: ContentData<D>,
    cache: DescriptionCache,
    on_reload: ReloadHook<D, H>,
}

impl<D: Clone, H: ContentViewHolder<D>> ContentDescription<D, H> {
    pub fn create_view_holder(&self) -> H {
        (self.view_holder)()
    }

    /// Runs the view binder, then binds the current data snapshot.
    pub fn bind_view_holder(&self, holder: &mut H) -> Result<()> {
        (self.view_binder)(holder);
        let data = self.data.snapshot();
        holder.bind(&self.cache, Some(&data))
    }
}

impl<D, H> ContentDescription<D, H> {
    /// Invokes the reload hook with an optional payload.
    pub fn reload(&self, payload: Option<&dyn Any>) {
        (self.on_reload)(self, payload);
    }

    /// State shared by every view holder this description is bound to.
    pub fn cache(&self) -> &DescriptionCache {
        &self.cache
    }

    pub fn data(&self) -> &ContentData<D> {
        &self.data
    }
}

impl<D, H> fmt::Debug for ContentDescription<D, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentDescription")
            .field("data", &self.data)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

enum HolderFactory<V: ScrollableView, D, I, H> {
    /// Builds `H` from the configured view factory.
    WithView(Rc<dyn Fn(Rc<V>, HolderConfig<V, D, I>) -> H>),
    Custom(Rc<dyn Fn(HolderConfig<V, D, I>) -> H>),
}

/// Builds the [`ContentDescription`] of a horizontally scrolling sub-list.
///
/// ```ignore
/// let description = SubListContent::paginated(source, || ItemHolder::default())
///     .view(|| Rc::new(HeadlessView::new(100, 300)))
///     .item_binder(|holder, item| holder.text = item.title.clone())
///     .lifecycle_owner(lifecycle)
///     .build()?;
/// ```
///
/// The default view holder is a [`SubListViewHolder`] and requires [`view`](Self::view).
/// [`view_holder`](Self::view_holder) replaces it; call it before
/// [`view_binder`](Self::view_binder) and [`on_reload`](Self::on_reload), which are typed by
/// the holder.
pub struct SubListContent<V: ScrollableView, D, I, H = SubListViewHolder<V, D, I>> {
    data: ContentData<D>,
    view: Option<Rc<dyn Fn() -> Rc<V>>>,
    view_holder: HolderFactory<V, D, I, H>,
    view_binder: Rc<dyn Fn(&mut H)>,
    config: HolderConfig<V, D, I>,
    on_reload: ReloadHook<D, H>,
}

impl<V, D, I> SubListContent<V, D, I>
where
    V: ScrollableView + 'static,
    D: Clone + 'static,
    I: 'static,
{
    pub fn new(
        data: ContentData<D>,
        item_count: impl Fn(&D) -> usize + 'static,
        item_data: impl Fn(&D, usize) -> I + 'static,
        item_view_holder: impl Fn() -> V::ItemHolder + 'static,
    ) -> Self {
        let binding = ItemBinding::new(item_count, item_data, item_view_holder);
        let mut config = HolderConfig::new(binding);
        config.source = data.source();
        Self {
            data,
            view: None,
            view_holder: HolderFactory::WithView(Rc::new(SubListViewHolder::new)),
            view_binder: Rc::new(|_| {}),
            config,
            on_reload: Rc::new(|_, _| {}),
        }
    }
}

impl<V, I> SubListContent<V, Vec<I>, I>
where
    V: ScrollableView + 'static,
    I: Clone + 'static,
{
    /// A static sub-list over `items`.
    pub fn from_items(
        items: Vec<I>,
        item_view_holder: impl Fn() -> V::ItemHolder + 'static,
    ) -> Self {
        Self::new(
            ContentData::Static(items),
            |items: &Vec<I>| items.len(),
            |items: &Vec<I>, position| items[position].clone(),
            item_view_holder,
        )
    }
}

impl<V, I> SubListContent<V, PaginatedState<I>, I>
where
    V: ScrollableView + 'static,
    I: Clone + 'static,
{
    /// A sub-list that pages through `source`.
    pub fn paginated(
        source: PaginatedSource<I>,
        item_view_holder: impl Fn() -> V::ItemHolder + 'static,
    ) -> Self {
        Self::new(
            ContentData::Paginated(Rc::new(source)),
            |state: &PaginatedState<I>| state.len(),
            |state: &PaginatedState<I>, position| state.loaded()[position].clone(),
            item_view_holder,
        )
    }
}

impl<V, D, I, H> SubListContent<V, D, I, H>
where
    V: ScrollableView + 'static,
    D: Clone + 'static,
    I: 'static,
    H: ContentViewHolder<D> + 'static,
{
    /// Creates the scrollable view for each default view holder.
    pub fn view(mut self, factory: impl Fn() -> Rc<V> + 'static) -> Self {
        self.view = Some(Rc::new(factory));
        self
    }

    /// Replaces the default view holder. Resets the view binder and the reload hook.
    pub fn view_holder<H2>(
        self,
        factory: impl Fn(HolderConfig<V, D, I>) -> H2 + 'static,
    ) -> SubListContent<V, D, I, H2>
    where
        H2: ContentViewHolder<D> + 'static,
    {
        SubListContent {
            data: self.data,
            view: self.view,
            view_holder: HolderFactory::Custom(Rc::new(factory)),
            view_binder: Rc::new(|_| {}),
            config: self.config,
            on_reload: Rc::new(|_, _| {}),
        }
    }

    /// Runs on the holder before each data bind.
    pub fn view_binder(mut self, binder: impl Fn(&mut H) + 'static) -> Self {
        self.view_binder = Rc::new(binder);
        self
    }

    /// Fills an item holder with one item.
    pub fn item_binder(mut self, binder: impl Fn(&mut V::ItemHolder, &I) + 'static) -> Self {
        self.config.binding = self.config.binding.with_item_binder(binder);
        self
    }

    pub fn layout_manager(
        mut self,
        factory: impl Fn(&V) -> Rc<dyn LayoutManager> + 'static,
    ) -> Self {
        self.config = self.config.with_layout_manager(factory);
        self
    }

    /// Ties every binding to `owner`: its destroy event tears the sub-list down.
    pub fn lifecycle_owner(mut self, owner: Rc<dyn LifecycleOwner>) -> Self {
        self.config = self.config.with_lifecycle(owner);
        self
    }

    pub fn options(mut self, options: AdapterOptions) -> Self {
        self.config = self.config.with_options(options);
        self
    }

    pub fn on_reload(
        mut self,
        hook: impl Fn(&ContentDescription<D, H>, Option<&dyn Any>) + 'static,
    ) -> Self {
        self.on_reload = Rc::new(hook);
        self
    }

    /// Fails with [`Error::MissingViewFactory`] when the default view holder has no view
    /// factory.
    pub fn build(self) -> Result<ContentDescription<D, H>> {
        let config = self.config;
        let view_holder: Rc<dyn Fn() -> H> = match self.view_holder {
            HolderFactory::WithView(holder) => {
                let Some(view) = self.view else {
                    pwarn!("SubListContent::build: no view factory");
                    return Err(Error::MissingViewFactory);
                };
                Rc::new(move || holder(view(), config.clone()))
            }
            HolderFactory::Custom(holder) => Rc::new(move || holder(config.clone())),
        };
        Ok(ContentDescription {
            view_holder,
            view_binder: self.view_binder,
            data: self.data,
            cache: DescriptionCache::new(),
            on_reload: self.on_reload,
        })
    }
}

impl<V: ScrollableView, D, I, H> fmt::Debug for SubListContent<V, D, I, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubListContent")
            .field("data", &self.data)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
