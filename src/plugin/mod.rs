/*
 * @Author       : 老董
 * @Date         : 2026-02-16 10:30:00
 * @LastEditors  : 老董
 * @LastEditTime : 2026-03-02 15:40:00
 * @Description  : 对接外部解码框架的插件边界。只负责设备选择、解码引擎的
 *                 惰性初始化与源句词id序列的转发，不含任何解码算法——
 *                 集束搜索、词表编码等都在引擎一侧。
 */

use std::path::Path;
use std::rc::Rc;
use thiserror::Error;

/// 源语言词表中的词id
pub type WordId = usize;

/// 不透明的句子级解码状态（内容由具体引擎定义，供下游集束搜索使用）
pub trait DecoderState {}

/// 堆上共享的解码状态句柄
pub type StateHandle = Rc<dyn DecoderState>;

/// 插件边界的错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PluginError {
    #[error("解码引擎尚未初始化（需要先调用init_engine）")]
    NotInitialized,

    #[error("解码引擎初始化失败: {0}")]
    EngineInit(String),

    #[error("无效的设备序号: 请求{requested}，可用设备数为{available}")]
    InvalidDevice { requested: usize, available: usize },
}

/// 解码引擎接口（由外部解码框架实现）
pub trait DecodingEngine {
    /// 送入一个源句的词id序列，返回句子级解码状态句柄
    fn set_source(&mut self, words: &[WordId]) -> Result<Vec<StateHandle>, PluginError>;
}

/// 解码引擎工厂：从配置文件路径构建引擎
pub type EngineFactory = Box<dyn Fn(&Path) -> Result<Box<dyn DecodingEngine>, PluginError>>;

/// NMT解码插件
///
/// 持有一个解码引擎并向其转发逐句的翻译请求。引擎从配置文件惰性初始化，
/// 设备选择会把调用线程之后的工作绑定到选定设备上。
pub struct NmtPlugin {
    factory: EngineFactory,
    engine: Option<Box<dyn DecodingEngine>>,
    device: usize,
}

impl NmtPlugin {
    /// 用引擎工厂创建插件（引擎本身推迟到`init_engine`时构建）
    pub fn new(factory: EngineFactory) -> Self {
        Self {
            factory,
            engine: None,
            device: 0,
        }
    }

    /// 可用计算设备数量（没有GPU枚举时至少有CPU一个）
    pub fn available_devices() -> usize {
        1
    }

    /// 选定设备：调用线程之后的解码工作都绑定在该设备上
    pub fn set_device(&mut self, device: usize) -> Result<(), PluginError> {
        let available = Self::available_devices();
        if device >= available {
            return Err(PluginError::InvalidDevice {
                requested: device,
                available,
            });
        }
        self.device = device;
        Ok(())
    }

    /// 当前绑定的设备序号
    pub const fn device(&self) -> usize {
        self.device
    }

    /// 从配置文件惰性初始化解码引擎（已初始化时为无操作）
    pub fn init_engine<P: AsRef<Path>>(&mut self, config_path: P) -> Result<(), PluginError> {
        if self.engine.is_none() {
            self.engine = Some((self.factory)(config_path.as_ref())?);
        }
        Ok(())
    }

    /// 引擎是否已初始化
    pub const fn is_initialized(&self) -> bool {
        self.engine.is_some()
    }

    /// 转发一个源句的词id序列，返回供下游集束搜索使用的状态句柄
    pub fn set_source(&mut self, words: &[WordId]) -> Result<Vec<StateHandle>, PluginError> {
        self.engine
            .as_mut()
            .ok_or(PluginError::NotInitialized)?
            .set_source(words)
    }
}
