type Predicate<D> = Box<dyn Fn(&D) -> bool + Send + Sync>;
type Extractor<D, T> = Box<dyn Fn(&D) -> T + Send + Sync>;

pub struct Strategy<D, T> {
    name: String,
    predicate: Predicate<D>,
    extractor: Extractor<D, T>,
}

/// Value produced by the winning strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved<T> {
    pub strategy: String,
    pub value: T,
}

pub struct Cascade<D, T> {
    strategies: Vec<Strategy<D, T>>,
}

impl<D, T> Default for Cascade<D, T> {
    fn default() -> Self {
        Self { strategies: Vec::new() }
    }
}

impl<D, T> Cascade<D, T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(
        mut self,
        name: impl Into<String>,
        predicate: impl Fn(&D) -> bool + Send + Sync + 'static,
        extractor: impl Fn(&D) -> T + Send + Sync + 'static,
    ) -> Self {
        self.strategies.push(Strategy {
            name: name.into(),
            predicate: Box::new(predicate),
            extractor: Box::new(extractor),
        });
        self
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    pub fn run(&self, doc: &D) -> Option<Resolved<T>> {
        self.strategies
            .iter()
            .find(|s| (s.predicate)(doc))
            .map(|s| Resolved {
                strategy: s.name.clone(),
                value: (s.extractor)(doc),
            })
    }
}
