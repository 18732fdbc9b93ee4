mod helpers;
mod login;
mod recipe;
mod shop;
mod sync;

pub(crate) use login::cmd_login;
pub(crate) use recipe::{cmd_list, cmd_search, cmd_show, cmd_star, cmd_starred, cmd_tag};
pub(crate) use shop::{
    cmd_shop_add, cmd_shop_check, cmd_shop_clear, cmd_shop_list, cmd_shop_remove,
};
pub(crate) use sync::cmd_sync;
