//! 路由表

use infrastructure_common::{AdminError, AdminResult};
use module_abstractions::{PublishedRoute, RouteDescriptor, RouteScope};
use parking_lot::RwLock;
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
struct RouteSlot {
    route: PublishedRoute,
    /// 撤回中的路由不可达，但路径仍归原模块所有
    live: bool,
}

/// 路由表
///
/// 以 (作用域, 路径) 为键，一个路径同一时刻只属于一个模块
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: RwLock<BTreeMap<(RouteScope, String), RouteSlot>>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn find_conflict(
        routes: &BTreeMap<(RouteScope, String), RouteSlot>,
        module: &str,
        entries: &[(RouteScope, RouteDescriptor)],
    ) -> AdminResult<()> {
        for (scope, route) in entries {
            if let Some(existing) = routes.get(&(*scope, route.path.clone())) {
                if existing.route.module != module {
                    return Err(AdminError::RouteConflict {
                        path: route.path.clone(),
                        owner: existing.route.module.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// 检查路由是否都可以发布
    pub fn check_available(
        &self,
        module: &str,
        entries: &[(RouteScope, RouteDescriptor)],
    ) -> AdminResult<()> {
        Self::find_conflict(&self.routes.read(), module, entries)
    }

    /// 发布模块的全部路由，任一路由冲突时一条都不发布
    pub fn publish(&self, module: &str, entries: &[(RouteScope, RouteDescriptor)]) -> AdminResult<()> {
        let mut routes = self.routes.write();
        Self::find_conflict(&routes, module, entries)?;
        for (scope, route) in entries {
            routes.insert(
                (*scope, route.path.clone()),
                RouteSlot {
                    route: PublishedRoute {
                        scope: *scope,
                        path: route.path.clone(),
                        handler: route.handler.clone(),
                        module: module.to_string(),
                    },
                    live: true,
                },
            );
        }
        Ok(())
    }

    /// 撤回模块的全部路由，返回撤回数量
    pub fn unpublish(&self, module: &str) -> usize {
        let mut routes = self.routes.write();
        let before = routes.len();
        routes.retain(|_, slot| slot.route.module != module);
        before - routes.len()
    }

    fn set_live(&self, module: &str, live: bool) -> usize {
        let mut changed = 0;
        for slot in self.routes.write().values_mut() {
            if slot.route.module == module && slot.live != live {
                slot.live = live;
                changed += 1;
            }
        }
        changed
    }

    /// 让模块的路由不可达，但保留路径的归属，其他模块无法占用
    pub fn withdraw(&self, module: &str) -> usize {
        self.set_live(module, false)
    }

    /// 恢复撤回中的路由
    pub fn restore(&self, module: &str) -> usize {
        self.set_live(module, true)
    }

    /// 释放撤回中的路由，返回释放数量
    pub fn release(&self, module: &str) -> usize {
        let mut routes = self.routes.write();
        let before = routes.len();
        routes.retain(|_, slot| slot.live || slot.route.module != module);
        before - routes.len()
    }

    /// 路由所属模块
    pub fn owner(&self, scope: RouteScope, path: &str) -> Option<String> {
        self.routes
            .read()
            .get(&(scope, path.to_string()))
            .filter(|slot| slot.live)
            .map(|slot| slot.route.module.clone())
    }

    /// 指定作用域下按路径排序的路由
    pub fn routes(&self, scope: RouteScope) -> Vec<PublishedRoute> {
        self.routes
            .read()
            .values()
            .filter(|slot| slot.live && slot.route.scope == scope)
            .map(|slot| slot.route.clone())
            .collect()
    }

    /// 可达路由数量
    pub fn len(&self) -> usize {
        self.routes.read().values().filter(|slot| slot.live).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
