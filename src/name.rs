/// Types that expose a name used for path lookups.
pub trait HasName {
    fn get_name(&self) -> &str;
}

impl<T: HasName + ?Sized> HasName for &T {
    fn get_name(&self) -> &str {
        (*self).get_name()
    }
}

impl<T: HasName + ?Sized> HasName for Box<T> {
    fn get_name(&self) -> &str {
        (**self).get_name()
    }
}

/// Name lookups over slices of `T: HasName`.
pub trait FindByName<T> {
    /// Index of the first item called `name`.
    fn position_by_name(&self, name: &str) -> Option<usize>;

    fn find_by_name(&self, name: &str) -> Option<&T>;

    fn contains_name(&self, name: &str) -> bool {
        self.position_by_name(name).is_some()
    }
}

impl<T: HasName> FindByName<T> for [T] {
    fn position_by_name(&self, name: &str) -> Option<usize> {
        self.iter().position(|item| item.get_name() == name)
    }

    fn find_by_name(&self, name: &str) -> Option<&T> {
        self.iter().find(|item| item.get_name() == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named(String);
    impl HasName for Named {
        fn get_name(&self) -> &str {
            &self.0
        }
    }

    #[test]
    fn test_has_name_box() {
        let item: Box<Named> = Box::new(Named("hello".to_string()));
        assert_eq!(item.get_name(), "hello");
    }

    #[test]
    fn test_find_by_name() {
        let items = vec![
            Named("beam".to_string()),
            Named("ball".to_string()),
            Named("ball".to_string()),
        ];
        assert_eq!(items.position_by_name("ball"), Some(1));
        assert_eq!(items.find_by_name("beam").map(|n| n.get_name()), Some("beam"));
        assert!(!items.contains_name("grid"));
    }
}
