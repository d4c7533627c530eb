use crate::app::types::GroupFilter;
use crate::app::App;

pub trait AppKeymapExt {
    fn get_current_group(&self) -> Option<GroupFilter>;
    fn is_editing(&self) -> bool;
}

impl AppKeymapExt for App {
    fn get_current_group(&self) -> Option<GroupFilter> {
        self.groups.get(self.selected_group).copied()
    }

    fn is_editing(&self) -> bool {
        self.editor.is_some()
    }
}
