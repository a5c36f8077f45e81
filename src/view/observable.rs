use tokio::sync::watch;

/// A value that UI bindings can subscribe to. Every mutation notifies the
/// current subscribers; having none is fine.
#[derive(Debug)]
pub struct Observable<T> {
    tx: watch::Sender<T>,
}

impl<T> Observable<T> {
    pub fn new(value: T) -> Self {
        let (tx, _rx) = watch::channel(value);
        Observable { tx }
    }

    pub fn borrow(&self) -> watch::Ref<'_, T> {
        self.tx.borrow()
    }

    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.tx.borrow().clone()
    }

    pub fn set(&self, value: T) -> T {
        self.tx.send_replace(value)
    }

    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut T),
    {
        self.tx.send_modify(f);
    }

    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.tx.subscribe()
    }
}

impl<T> Observable<Vec<T>> {
    pub fn push(&self, item: T) {
        self.tx.send_modify(|items| items.push(item));
    }

    pub fn len(&self) -> usize {
        self.tx.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tx.borrow().is_empty()
    }

    /// Removes the first matching item. Subscribers are only notified when
    /// something was removed.
    pub fn remove_first<P>(&self, pred: P) -> Option<T>
    where
        P: Fn(&T) -> bool,
    {
        let mut removed = None;
        self.tx.send_if_modified(|items| match items.iter().position(|item| pred(item)) {
            Some(index) => {
                removed = Some(items.remove(index));
                true
            }
            None => false,
        });
        removed
    }

    pub fn find<P, R>(&self, pred: P, f: impl FnOnce(&T) -> R) -> Option<R>
    where
        P: Fn(&T) -> bool,
    {
        self.tx.borrow().iter().find(|item| pred(item)).map(f)
    }
}

impl<T: Default> Default for Observable<T> {
    fn default() -> Self {
        Observable::new(T::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscribers_see_updates() {
        let list = Observable::new(vec![1, 2, 3]);
        let mut rx = list.subscribe();
        assert!(!rx.has_changed().unwrap());

        list.push(4);
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_remove_first_only_notifies_on_change() {
        let list = Observable::new(vec!["a", "b", "a"]);
        let mut rx = list.subscribe();

        assert_eq!(list.remove_first(|s| *s == "z"), None);
        assert!(!rx.has_changed().unwrap());

        assert_eq!(list.remove_first(|s| *s == "a"), Some("a"));
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), vec!["b", "a"]);
    }

    #[test]
    fn test_set_returns_previous() {
        let selected: Observable<Option<u32>> = Observable::default();
        assert_eq!(selected.set(Some(7)), None);
        assert_eq!(selected.get(), Some(7));
    }
}
