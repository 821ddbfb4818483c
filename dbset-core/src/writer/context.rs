#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fragment {
    #[default]
    None,
    SqlAlterTable,
    SqlCreateIndex,
    SqlCreateTable,
    SqlDeleteFrom,
    SqlDeleteFromWhere,
    SqlDropTable,
    SqlInsertInto,
    SqlInsertIntoValues,
    SqlSelect,
    SqlSelectFrom,
    SqlSelectOrderBy,
    SqlSelectWhere,
    SqlUpdate,
    SqlUpdateSet,
    SqlUpdateWhere,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Context {
    pub fragment: Fragment,
}

impl Context {
    pub fn new(fragment: Fragment) -> Self {
        Self { fragment }
    }

    pub fn switch_fragment<'s>(&'s mut self, fragment: Fragment) -> ContextUpdater<'s> {
        ContextUpdater {
            current: Context { fragment },
            previous: self,
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Context::new(Fragment::None)
    }
}

/// Nested context, restores nothing but keeps the parent borrowed while alive.
pub struct ContextUpdater<'a> {
    pub current: Context,
    pub previous: &'a mut Context,
}
